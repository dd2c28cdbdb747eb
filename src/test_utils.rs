//! Message builders shared by unit tests

use crate::core::Side;
use crate::parsing::MessageEncoder;

/// Encode one well-formed trade message, escaping as needed
pub fn trade_message(order_id: &str, symbol: &str, side: Side, quantity: u64, ts: u64) -> Vec<u8> {
    let mut buf = Vec::with_capacity(64);
    MessageEncoder::new(&mut buf).trade(order_id.as_bytes(), symbol.as_bytes(), side, quantity, ts);
    buf
}

/// Newline-framed stream of `count` trades cycling through `symbols`
pub fn trade_stream(symbols: &[&str], count: usize) -> Vec<u8> {
    let mut out = Vec::new();
    for i in 0..count {
        let side = if i % 2 == 0 { Side::Buy } else { Side::Sell };
        let symbol = symbols[i % symbols.len()];
        out.extend_from_slice(&trade_message(&format!("O{i}"), symbol, side, 1, i as u64));
        out.push(b'\n');
    }
    out
}
