//! Interactive conversion: amounts are read line by line (stdin for the
//! command) and the view is reprinted whenever either leg changes.

use super::ui;
use crate::App;
use crate::core::{Asset, ConversionView, ConvertSession, Update};
use anyhow::Result;
use std::io::Write;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tracing::{debug, warn};

/// One line of user input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    Amount(String),
    Sell(Option<String>),
    Buy(Option<String>),
    Quit,
}

pub fn parse_input(line: &str) -> Input {
    let line = line.trim();
    let Some(command) = line.strip_prefix(':') else {
        return Input::Amount(line.to_string());
    };

    let mut parts = command.split_whitespace();
    let name = parts.next().unwrap_or_default();
    let symbol = parts.next().map(str::to_string);
    match name {
        "sell" => Input::Sell(symbol),
        "buy" => Input::Buy(symbol),
        "q" | "quit" => Input::Quit,
        _ => Input::Amount(line.to_string()),
    }
}

enum Event {
    Line(std::io::Result<Option<String>>),
    Session(Option<Update>),
}

fn select_asset(assets: &[Asset], symbol: Option<&str>) -> Result<Option<Asset>> {
    symbol
        .map(|symbol| super::resolve_asset(assets, symbol))
        .transpose()
}

const HELP: &str = "Type an amount to convert. `:sell SYM` / `:buy SYM` pick assets, \
                    `:buy` clears the buy leg, `:quit` exits.";

pub async fn run(app: &App, sell: Option<&str>, buy: Option<&str>) -> Result<()> {
    let stdin = BufReader::new(tokio::io::stdin());
    run_with_io(app, sell, buy, stdin, &mut std::io::stdout()).await
}

/// Runs the interactive loop over any line source, rendering to `out`.
/// When `input` ends, pending quotes are awaited before returning.
pub async fn run_with_io<R, W>(
    app: &App,
    sell: Option<&str>,
    buy: Option<&str>,
    input: R,
    out: &mut W,
) -> Result<()>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    let assets = app.catalog.load().await?;

    let mut session = ConvertSession::new(app.services.clone(), app.config.debounce());
    session.select_sell_asset(select_asset(&assets, sell)?);
    session.select_buy_asset(select_asset(&assets, buy)?);

    writeln!(out, "{}", ui::style_text(HELP, ui::StyleType::Subtle))?;

    let mut lines = input.lines();
    let mut input_open = true;
    let mut last_view: Option<ConversionView> = None;

    loop {
        if !input_open && session.is_settled() {
            break;
        }

        let event = if input_open {
            tokio::select! {
                line = lines.next_line() => Event::Line(line),
                update = session.next_update() => Event::Session(update),
            }
        } else {
            Event::Session(session.next_update().await)
        };

        match event {
            Event::Line(line) => match line? {
                Some(line) => match parse_input(&line) {
                    Input::Amount(raw) => session.set_sell_amount(&raw),
                    Input::Sell(symbol) => match select_asset(&assets, symbol.as_deref()) {
                        Ok(asset) => session.select_sell_asset(asset),
                        Err(e) => writeln!(out, "{}", ui::style_text(&e.to_string(), ui::StyleType::Error))?,
                    },
                    Input::Buy(symbol) => match select_asset(&assets, symbol.as_deref()) {
                        Ok(asset) => session.select_buy_asset(asset),
                        Err(e) => writeln!(out, "{}", ui::style_text(&e.to_string(), ui::StyleType::Error))?,
                    },
                    Input::Quit => break,
                },
                None => {
                    debug!("stdin closed, waiting for pending quotes");
                    input_open = false;
                }
            },
            Event::Session(Some(update)) => debug!(?update, "Session update"),
            Event::Session(None) => {
                warn!("Conversion session closed");
                break;
            }
        }

        // Nothing is shown until the first commit.
        let Some(amount) = session.committed_amount() else {
            continue;
        };
        let view = session.view();
        if last_view.as_ref() != Some(&view) {
            writeln!(
                out,
                "{}",
                view.display_as_table(amount, session.sell_asset(), session.buy_asset())
            )?;
            last_view = Some(view);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_input() {
        assert_eq!(parse_input("12.5\n"), Input::Amount("12.5".to_string()));
        assert_eq!(parse_input(""), Input::Amount(String::new()));
        assert_eq!(
            parse_input(":sell eth"),
            Input::Sell(Some("eth".to_string()))
        );
        assert_eq!(
            parse_input("  :buy USDC-137 "),
            Input::Buy(Some("USDC-137".to_string()))
        );
        assert_eq!(parse_input(":buy"), Input::Buy(None));
        assert_eq!(parse_input(":q"), Input::Quit);
        assert_eq!(parse_input(":quit"), Input::Quit);
        // Unknown commands are passed through and render as a zero amount.
        assert_eq!(parse_input(":nope"), Input::Amount(":nope".to_string()));
    }
}
