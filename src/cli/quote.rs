use super::ui;
use crate::App;
use crate::core::{Asset, ConversionView, ConvertSession, Leg, LegView};
use anyhow::Result;
use comfy_table::Cell;
use tracing::debug;

impl ConversionView {
    pub fn display_as_table(
        &self,
        amount: &str,
        sell_asset: Option<&Asset>,
        buy_asset: Option<&Asset>,
    ) -> String {
        let mut table = ui::new_styled_table();
        table.set_header(vec![
            ui::header_cell("Leg"),
            ui::header_cell("Asset"),
            ui::header_cell("Amount"),
            ui::header_cell("Status"),
        ]);

        for (leg, asset, view) in [
            (Leg::Sell, sell_asset, &self.sell),
            (Leg::Buy, buy_asset, &self.buy),
        ] {
            table.add_row(leg_row(leg, asset, view));
        }

        format!(
            "{} {}\n\n{}",
            ui::style_text("Amount:", ui::StyleType::Label),
            if amount.trim().is_empty() { "-" } else { amount },
            table
        )
    }
}

fn leg_row(leg: Leg, asset: Option<&Asset>, view: &LegView) -> Vec<Cell> {
    let asset = asset.map_or_else(
        || ui::style_text("not selected", ui::StyleType::Subtle),
        |asset| asset.key().to_string(),
    );
    vec![
        Cell::new(leg),
        Cell::new(asset),
        ui::amount_cell(view),
        ui::status_cell(view),
    ]
}

/// Drives a session until the committed amount is fully resolved.
pub async fn wait_until_settled(session: &mut ConvertSession) {
    while !session.is_settled() {
        match session.next_update().await {
            Some(update) => debug!(?update, "Session update"),
            None => break,
        }
    }
}

pub async fn run(app: &App, sell: &str, buy: Option<&str>, amount: &str) -> Result<()> {
    super::validate_amount(amount)?;

    let assets = app.catalog.load().await?;
    let sell_asset = super::resolve_asset(&assets, sell)?;
    let buy_asset = buy
        .map(|symbol| super::resolve_asset(&assets, symbol))
        .transpose()?;

    let mut session = ConvertSession::new(app.services.clone(), app.config.debounce());
    // Commit before selecting so each leg resolves once.
    session.commit_amount(amount);
    session.select_sell_asset(Some(sell_asset));
    session.select_buy_asset(buy_asset);

    let spinner = ui::new_spinner("Fetching quotes...");
    wait_until_settled(&mut session).await;
    spinner.finish_and_clear();

    println!(
        "{}",
        session
            .view()
            .display_as_table(amount, session.sell_asset(), session.buy_asset())
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leg(amount: &str, error: Option<&str>) -> LegView {
        LegView {
            converted_amount: amount.to_string(),
            is_pending: false,
            is_fetching: false,
            error: error.map(str::to_string),
        }
    }

    #[test]
    fn test_display_as_table() {
        let view = ConversionView {
            sell: leg("2", None),
            buy: leg("0", Some("Failed to resolve price for USDC-1: timeout")),
        };
        let eth = Asset::new("ETH", "Ethereum", "8453");
        let usdc = Asset::new("USDC", "USD Coin", "1");

        let output = view.display_as_table("5000", Some(&eth), Some(&usdc));

        assert!(output.contains("5000"));
        assert!(output.contains("ETH-8453"));
        assert!(output.contains("USDC-1"));
        assert!(output.contains("Failed to resolve price for USDC-1"));
    }

    #[test]
    fn test_display_without_buy_asset() {
        let view = ConversionView {
            sell: leg("1", None),
            buy: leg("0", None),
        };
        let usdc = Asset::new("USDC", "USD Coin", "1");

        let output = view.display_as_table("1", Some(&usdc), None);
        assert!(output.contains("not selected"));
    }
}
