use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use chrono::Utc;
use tracing::debug;

use crate::models::dashboard::DashboardView;
use crate::parameters::BUDGET_MAX;
use crate::state::{AppState, DASHBOARD_KEY};
use crate::store::LedgerStore;

use super::HttpError;

pub(super) async fn get_dashboard(
    State(state): State<AppState>,
) -> Result<Json<DashboardView>, HttpError> {
    if let Some(cached) = state.cache.summaries.get(DASHBOARD_KEY).await {
        debug!("Serving cached dashboard");
        let view = serde_json::from_value(cached)
            .map_err(|err| HttpError::new(StatusCode::INTERNAL_SERVER_ERROR, err.to_string()))?;
        return Ok(Json(view));
    }

    // Writers invalidate after releasing the lock, so the guard is held
    // until the fresh view is cached.
    let store = state.store.read().await;
    let view = build_dashboard(&store);
    let encoded = serde_json::to_value(&view)
        .map_err(|err| HttpError::new(StatusCode::INTERNAL_SERVER_ERROR, err.to_string()))?;
    state
        .cache
        .summaries
        .insert(DASHBOARD_KEY.to_string(), encoded)
        .await;
    drop(store);
    Ok(Json(view))
}

fn build_dashboard(store: &LedgerStore) -> DashboardView {
    let treasury = store.treasury_summary(Utc::now());
    let budget_max = store.parameters().number(BUDGET_MAX).unwrap_or(0);
    let spent = treasury.total_expenses;
    let spent_percent = if budget_max > 0 {
        spent as f64 / budget_max as f64 * 100.0
    } else {
        0.0
    };

    DashboardView {
        budget_max,
        spent,
        remaining: budget_max.saturating_sub(spent),
        spent_percent,
        balance: treasury.balance,
        pending_transactions: treasury.pending,
        open_propositions: store.vote_stats().open,
        pending_notifications: store.pending_notifications(),
        forecast_net: store.forecast_totals().net,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ApiConfig;
    use crate::parameters::ParameterSet;
    use crate::store::{NewTransaction, Review, TransactionKind};

    #[test]
    fn spent_tracks_validated_expenses() {
        let mut store = LedgerStore::new(ParameterSet::default(), 0, Utc::now());
        let id = store
            .record_transaction(
                NewTransaction {
                    kind: TransactionKind::Expense,
                    amount: 500_000,
                    counterparty: "Office renovation".to_string(),
                    description: "Administrative offices".to_string(),
                },
                Utc::now(),
            )
            .unwrap()
            .id;

        let before = build_dashboard(&store);
        assert_eq!(before.spent, 0);
        assert_eq!(before.pending_transactions, 1);

        store.review_transaction(id, Review::Validate, Utc::now()).unwrap();
        let after = build_dashboard(&store);
        assert_eq!(after.budget_max, 2_000_000);
        assert_eq!(after.spent, 500_000);
        assert_eq!(after.remaining, 1_500_000);
        assert!((after.spent_percent - 25.0).abs() < f64::EPSILON);
        assert_eq!(after.balance, -500_000);
    }

    #[tokio::test]
    async fn cached_dashboard_follows_writes() {
        let config = ApiConfig::from_toml(
            "[server]\nport = 8080\n[cache]\nsummary_max_capacity = 4\nsummary_ttl_seconds = 60\n",
        )
        .expect("config");
        let state = AppState::from_config(&config);

        let id = {
            let mut store = state.store.write().await;
            store
                .record_transaction(
                    NewTransaction {
                        kind: TransactionKind::Expense,
                        amount: 1_000,
                        counterparty: "Stationery".to_string(),
                        description: "Paper".to_string(),
                    },
                    Utc::now(),
                )
                .expect("transaction")
                .id
        };
        state.cache.invalidate();

        let Json(first) = get_dashboard(State(state.clone())).await.expect("dashboard");
        assert_eq!(first.pending_transactions, 1);
        assert!(state.cache.summaries.get(DASHBOARD_KEY).await.is_some());

        state
            .store
            .write()
            .await
            .review_transaction(id, Review::Validate, Utc::now())
            .expect("review");
        state.cache.invalidate();

        let Json(second) = get_dashboard(State(state)).await.expect("dashboard");
        assert_eq!(second.pending_transactions, 0);
        assert_eq!(second.spent, 1_000);
    }
}
