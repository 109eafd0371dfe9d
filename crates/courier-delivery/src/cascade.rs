//! Ordered fallback strategies as data.
//!
//! "Try X, fall back to Y" paths in the delivery flow are expected behavior,
//! not exceptional behavior: each strategy returns a `Result`, and
//! [`run_cascade`] returns the first success or an aggregate failure naming
//! every attempt. Strategies are built lazily so a later strategy's work
//! never runs once an earlier one succeeds.

use std::future::Future;
use std::pin::Pin;

use courier_browser::UiError;
use tracing::debug;

type StrategyFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, UiError>> + Send + 'a>>;

/// One lazily-constructed fallback strategy.
pub struct Strategy<'a, T> {
    label: &'static str,
    run: Box<dyn FnOnce() -> StrategyFuture<'a, T> + Send + 'a>,
}

impl<'a, T> Strategy<'a, T> {
    pub fn new<F, Fut>(label: &'static str, f: F) -> Self
    where
        F: FnOnce() -> Fut + Send + 'a,
        Fut: Future<Output = Result<T, UiError>> + Send + 'a,
    {
        Self {
            label,
            run: Box::new(move || Box::pin(f())),
        }
    }
}

/// The winning strategy and its result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CascadeHit<T> {
    pub strategy: &'static str,
    pub value: T,
}

/// Every strategy failed. `attempts` lists `(label, error)` in order.
#[derive(Debug)]
pub struct CascadeExhausted {
    pub attempts: Vec<(&'static str, UiError)>,
}

impl std::fmt::Display for CascadeExhausted {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "all strategies failed:")?;
        for (label, err) in &self.attempts {
            write!(f, " [{label}: {err}]")?;
        }
        Ok(())
    }
}

/// Run strategies in order; first success wins and later strategies are
/// never constructed.
pub async fn run_cascade<T>(
    strategies: Vec<Strategy<'_, T>>,
) -> Result<CascadeHit<T>, CascadeExhausted> {
    let mut attempts = Vec::new();
    for strategy in strategies {
        let label = strategy.label;
        match (strategy.run)().await {
            Ok(value) => {
                debug!(strategy = label, "cascade strategy succeeded");
                return Ok(CascadeHit {
                    strategy: label,
                    value,
                });
            }
            Err(err) => {
                debug!(strategy = label, error = %err, "cascade strategy failed");
                attempts.push((label, err));
            }
        }
    }
    Err(CascadeExhausted { attempts })
}
