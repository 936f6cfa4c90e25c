pub mod fields;

use std::sync::LazyLock;

use scraper::{ElementRef, Html, Selector};
use tracing::debug;

use crate::error::ScrapeError;

// Product card layout of the catalog listing, as served to the desktop site.
static CARD_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("div.ProductCardVerticalLayout").unwrap());
static DESCRIPTION_SEL: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("div.ProductCardVerticalLayout__wrapper-description").unwrap()
});
static ANCHOR_SEL: LazyLock<Selector> = LazyLock::new(|| Selector::parse("a").unwrap());
static FOOTER_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("div.ProductCardVerticalLayout__footer").unwrap());
static CURRENT_PRICE_SEL: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("span.ProductCardVerticalPrice__price-current_current-price").unwrap()
});
static CITY_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("button.MainHeader__open-text").unwrap());

/// One product observation from the listing page. Immutable once built;
/// price 0 stands for "no price shown on the card".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub link: String,
    pub name: String,
    pub price: u32,
}

/// Extract one record per product card, in document order, duplicates
/// included. A card without a description or link element aborts the whole
/// run; a card without a current-price element yields price 0.
pub fn extract_records(html: &str) -> Result<Vec<Record>, ScrapeError> {
    if html.trim().is_empty() {
        return Err(ScrapeError::MalformedInput);
    }
    let doc = Html::parse_document(html);

    let mut records = Vec::new();
    for (i, card) in doc.select(&CARD_SEL).enumerate() {
        let description = card.select(&DESCRIPTION_SEL).next().ok_or(
            ScrapeError::MissingField {
                field: "description",
                container: i,
            },
        )?;

        let anchor = card
            .select(&ANCHOR_SEL)
            .next()
            .ok_or(ScrapeError::MissingField {
                field: "link",
                container: i,
            })?;
        // href passes through verbatim; an anchor without one yields ""
        let link = anchor.value().attr("href").unwrap_or_default().to_string();

        let price = match current_price(card) {
            Some(text) => fields::normalize_price(&text),
            None => {
                debug!("card {}: no current price element, recording 0", i);
                0
            }
        };

        records.push(Record {
            link,
            name: fields::normalize_name(&full_text(description)),
            price,
        });
    }

    Ok(records)
}

/// The shopper city the site detected for this session, shown in the page
/// header. Purely informational; absence is not an error.
pub fn extract_city(html: &str) -> Option<String> {
    let doc = Html::parse_document(html);
    doc.select(&CITY_SEL)
        .next()
        .map(|el| full_text(el).trim().to_string())
        .filter(|city| !city.is_empty())
}

fn current_price(card: ElementRef) -> Option<String> {
    let footer = card.select(&FOOTER_SEL).next()?;
    let span = footer.select(&CURRENT_PRICE_SEL).next()?;
    Some(full_text(span))
}

/// Concatenated text of an element's subtree.
fn full_text(el: ElementRef) -> String {
    el.text().collect()
}

// ── Tests ──
