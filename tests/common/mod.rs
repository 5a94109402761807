#![allow(dead_code)]

use folioledger::domain::engine::Engine;

/// Engine with one portfolio and one followed stock, the fixture most
/// scenarios start from.
pub fn engine_with_stock() -> Engine {
    let mut engine = Engine::new();
    run_all(
        &mut engine,
        &[
            "Add-Portfolio Name=Main",
            "Add-Stock SRef=[NASDAQ$X] Name=[Example Corp]",
            "Follow-Stock PfName=Main SRef=[NASDAQ$X]",
        ],
    );
    engine
}

pub fn run_all(engine: &mut Engine, lines: &[&str]) {
    for line in lines {
        engine
            .run(line)
            .unwrap_or_else(|e| panic!("{line} failed: {e}"));
    }
}

pub fn buy(engine: &mut Engine, pid: &str, date: &str, units: f64, price: f64) {
    engine
        .run(&format!(
            "Add-Holding PfName=Main SRef=[NASDAQ$X] PurchaseId={pid} Date={date} Units={units} Price={price} Fee=0 Rate=1"
        ))
        .unwrap();
}

pub fn sell(engine: &mut Engine, tid: &str, date: &str, units: f64, price: f64) {
    engine
        .run(&format!(
            "Add-Trade PfName=Main SRef=[NASDAQ$X] Date={date} Units={units} Price={price} Fee=0 TradeId={tid}"
        ))
        .unwrap();
}
