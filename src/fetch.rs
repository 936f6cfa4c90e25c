use anyhow::{Context, Result};
use reqwest::header::COOKIE;
use tracing::info;

/// Laptop listing, cheapest first, filtered to Core i7 / 16 GB / 1 TB models.
pub const CATALOG_URL: &str = "https://www.citilink.ru/catalog/noutbuki/?text=&sorting=price_asc&f=discount.any%2Crating.any%2C277_3cored1i7%2C19967_316d1gb%2C18332_31d1tb%2C9625_3&pf=discount.any%2Crating.any%2C277_3cored1i7%2C19967_316d1gb%2C18332_31d1tb";

// The site localizes assortment and prices by geo cookies; pin the region so
// every run sees the same catalog slice.
const COOKIES: &[(&str, &str)] = &[
    ("_space", "chlb_cl:"),
    ("_dy_df_geo", "Russia..Chelyabinsk"),
    ("_dy_df_geo", "RU.EU.RU_CHE.RU_CHE_Chelyabinsk"),
];

/// Fetch the catalog page and return its raw HTML. One attempt, no retries;
/// a failed fetch fails the run.
pub async fn fetch_page(url: &str) -> Result<String> {
    let client = reqwest::Client::new();
    let cookie_header = COOKIES
        .iter()
        .map(|(name, value)| format!("{}={}", name, value))
        .collect::<Vec<_>>()
        .join("; ");

    info!("Fetching catalog page: {}", url);
    let html = client
        .get(url)
        .header(COOKIE, cookie_header)
        .send()
        .await?
        .text()
        .await
        .context("Failed to fetch catalog page")?;

    Ok(html)
}
