//! Shared test fixtures for the skinport-deals integration tests.
//!
//! Provides item builders, a canned raw API payload, snapshot files in a
//! temporary data directory, and a one-shot local HTTP server standing in for
//! the Skinport API.

#![allow(dead_code)]

use std::io::{Read, Write};
use std::net::TcpListener;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use skinport_deals::{DiscountedItem, Item, MemoryBaseline, SkinportClient};

/// An item with the fields the filter looks at; everything else is absent.
pub fn item(name: &str, suggested: f64, min: f64, quantity: u64) -> Item {
    Item {
        name: name.to_string(),
        currency: Some("EUR".to_string()),
        suggested_price: Some(suggested),
        min_price: Some(min),
        max_price: Some(suggested * 1.5),
        mean_price: None,
        median_price: None,
        quantity: Some(quantity),
        created_at: Some(1_700_000_000),
        updated_at: Some(1_700_000_500),
        link: Some(format!(
            "https://skinport.com/item/{}",
            name.to_lowercase().replace(' ', "-")
        )),
    }
}

pub fn discounted(item: Item, discount_percent: f64) -> DiscountedItem {
    DiscountedItem {
        item,
        discount_percent,
    }
}

/// A raw `/v1/items` payload the way upstream sends it, including the
/// irregularities normalization has to cope with.
pub fn raw_items() -> serde_json::Value {
    serde_json::json!([
        {
            "market_hash_name": "AK-47 | Redline (Field-Tested)",
            "currency": "EUR",
            "suggested_price": 10.0,
            "item_page": "https://skinport.com/item/ak-47-redline-field-tested",
            "market_page": "https://skinport.com/market?item=AK-47%20%7C%20Redline",
            "min_price": 8.0,
            "max_price": 14.2,
            "mean_price": 9.7,
            "median_price": 9.5,
            "quantity": 25,
            "created_at": 1535988253,
            "updated_at": 1700000000
        },
        {
            "market_hash_name": "★ Karambit | Doppler (Factory New)",
            "currency": "EUR",
            "suggested_price": 800.0,
            "item_page": "https://skinport.com/item/karambit-doppler-factory-new",
            "min_price": 640.0,
            "max_price": 1200.0,
            "mean_price": 790.0,
            "median_price": 780.0,
            "quantity": 4,
            "created_at": 1535988253,
            "updated_at": 1700000000
        },
        {
            "market_hash_name": "★ Sport Gloves | Vice (Minimal Wear)",
            "currency": "EUR",
            "suggested_price": 1500.0,
            "min_price": 1275.0,
            "max_price": null,
            "quantity": 2,
            "created_at": 1535988253,
            "updated_at": 1700000000
        },
        {
            "market_hash_name": "StatTrak™ AWP | Asiimov (Field-Tested)",
            "currency": "EUR",
            "suggested_price": 120.0,
            "min_price": 90.0,
            "quantity": 11,
            "created_at": 1535988253,
            "updated_at": 1700000000
        },
        {
            "market_hash_name": "Sticker | Crown (Foil)",
            "currency": "EUR",
            "suggested_price": 900.0,
            "min_price": null,
            "quantity": 0,
            "created_at": 1535988253,
            "updated_at": 1700000000
        },
        {
            "market_hash_name": "P250 | Sand Dune (Battle-Scarred)",
            "currency": "EUR",
            "suggested_price": "0.03",
            "min_price": 0.03,
            "quantity": 300,
            "created_at": 1535988253,
            "updated_at": 1700000000
        },
        {
            "currency": "EUR",
            "suggested_price": 5.0,
            "min_price": 1.0,
            "quantity": 1
        }
    ])
}

/// Write `value` into `dir` as `items_<timestamp>.json`.
pub fn write_snapshot(dir: &Path, timestamp: &str, value: &serde_json::Value) -> PathBuf {
    let path = dir.join(format!("items_{timestamp}.json"));
    std::fs::write(&path, serde_json::to_vec_pretty(value).unwrap()).unwrap();
    path
}

/// Offline client over a temp data directory with an in-memory baseline.
///
/// The caller must keep the `TempDir` alive for the duration of the test.
pub fn offline_client() -> (SkinportClient, Arc<MemoryBaseline>, tempfile::TempDir) {
    let tmp_dir = tempfile::tempdir().unwrap();
    let baseline = Arc::new(MemoryBaseline::new());
    let client = SkinportClient::builder()
        .data_dir(tmp_dir.path())
        .offline(true)
        .baseline(baseline.clone())
        .build()
        .unwrap();
    (client, baseline, tmp_dir)
}

/// Serve exactly one HTTP response on a random local port.
///
/// Returns the base URL and a handle yielding the raw request text.
pub fn serve_once(status_line: &str, body: &str) -> (String, JoinHandle<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    let response = format!(
        "HTTP/1.1 {status_line}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
        body.len()
    );

    let handle = thread::spawn(move || {
        let (mut stream, _) = listener.accept().unwrap();
        let mut request = Vec::new();
        let mut buf = [0u8; 1024];
        while !request.windows(4).any(|w| w == b"\r\n\r\n") {
            let n = stream.read(&mut buf).unwrap();
            if n == 0 {
                break;
            }
            request.extend_from_slice(&buf[..n]);
        }
        stream.write_all(response.as_bytes()).unwrap();
        stream.flush().unwrap();
        String::from_utf8_lossy(&request).into_owned()
    });

    (format!("http://{addr}/v1"), handle)
}
