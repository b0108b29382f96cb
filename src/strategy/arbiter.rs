use crate::models::{Decision, TradingDecision};

/// Merge a strategy candidate with an external advisory decision
///
/// Strict precedence, first match wins, no confidence blending:
/// 1. no strategy signal: external decision
/// 2. strategy STRONG_BUY / STRONG_SELL: strategy
/// 3. strategy BUY / SELL: strategy, even against an opposing external call
/// 4. strategy HOLD: external decision
pub fn arbitrate(strategy: Option<TradingDecision>, external: TradingDecision) -> TradingDecision {
    let Some(candidate) = strategy else {
        tracing::info!(
            external = %external.decision(),
            "No strategy signal, deferring to external decision"
        );
        return external;
    };

    match candidate.decision() {
        Decision::StrongBuy | Decision::StrongSell | Decision::Buy | Decision::Sell => {
            if candidate.decision() != external.decision() {
                tracing::info!(
                    strategy = %candidate.decision(),
                    external = %external.decision(),
                    source = candidate.source(),
                    strong = candidate.decision().is_strong(),
                    "Strategy signal overrides external decision"
                );
            }
            candidate
        }
        Decision::Hold => {
            tracing::debug!(
                external = %external.decision(),
                "Strategy holds, deferring to external decision"
            );
            external
        }
    }
}
