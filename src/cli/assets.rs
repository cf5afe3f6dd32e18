use super::ui;
use crate::App;
use crate::core::Asset;
use crate::providers::CatalogState;
use anyhow::Result;
use comfy_table::Cell;

pub fn display_assets(assets: &[Asset]) -> String {
    if assets.is_empty() {
        return ui::style_text("No assets available", ui::StyleType::Subtle);
    }

    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Symbol"),
        ui::header_cell("Name"),
        ui::header_cell("Chain"),
        ui::header_cell("Key"),
    ]);

    for asset in assets {
        table.add_row(vec![
            Cell::new(&asset.symbol),
            Cell::new(&asset.name),
            Cell::new(&asset.chain_id),
            Cell::new(asset.key()),
        ]);
    }

    format!(
        "{}\n\n{}",
        ui::style_text("Assets", ui::StyleType::Title),
        table
    )
}

pub fn display_catalog(state: &CatalogState) -> String {
    match state {
        CatalogState::NotLoaded => {
            ui::style_text("Asset catalog not loaded", ui::StyleType::Subtle)
        }
        CatalogState::Loading => ui::style_text("Loading assets...", ui::StyleType::Subtle),
        CatalogState::Loaded(assets) => display_assets(assets),
        CatalogState::Failed(error) => ui::style_text(&error.to_string(), ui::StyleType::Error),
    }
}

pub async fn run(app: &App) -> Result<()> {
    let loaded = app.catalog.load().await;
    println!("{}", display_catalog(&app.catalog.state()));
    loaded?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_assets_lists_every_key() {
        let output = display_assets(&[
            Asset::new("USDC", "USD Coin", "1"),
            Asset::new("ETH", "Ethereum", "8453"),
        ]);
        assert!(output.contains("USD Coin"));
        assert!(output.contains("USDC-1"));
        assert!(output.contains("ETH-8453"));
    }

    #[test]
    fn test_display_empty_catalog() {
        assert!(display_assets(&[]).contains("No assets available"));
    }

    #[test]
    fn test_display_catalog_states() {
        use crate::core::QuoteError;

        assert!(display_catalog(&CatalogState::NotLoaded).contains("not loaded"));
        assert!(display_catalog(&CatalogState::Loading).contains("Loading assets"));
        assert!(
            display_catalog(&CatalogState::Loaded(vec![Asset::new("ETH", "Ethereum", "8453")]))
                .contains("ETH-8453")
        );
        assert!(
            display_catalog(&CatalogState::Failed(QuoteError::CatalogUnavailable(
                "endpoint down".to_string()
            )))
            .contains("Asset catalog unavailable: endpoint down")
        );
    }
}
