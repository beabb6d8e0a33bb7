use std::sync::Arc;
use std::time::Duration;

use tracing::{error, info, Instrument};

use canteen_board::app_system::{setup_tracing, BoardConfig, BoardSystem};
use canteen_board::domain::{CouponNumber, IdentityContext, OrderStatus};
use canteen_board::notifier::{InMemorySubscriptionStore, NotificationDispatcher, Permission, TracingChannel};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    setup_tracing();

    let config = BoardConfig::from_env()?;
    info!(workflow = ?config.workflow, "Starting canteen board");

    let mut system = BoardSystem::new(&config, IdentityContext::staff("counter"));
    let staff = system.order_client.clone();

    let span = tracing::info_span!("coupon_entry");
    let order = async {
        info!("Entering coupon");
        staff.add_order(CouponNumber(7)).await
    }
    .instrument(span)
    .await?;

    if let Err(e) = staff.add_order(CouponNumber(7)).await {
        info!(error = %e, "Second entry of the same coupon rejected");
    }

    // The customer asks to be told when coupon 7 is ready.
    let dispatcher = NotificationDispatcher::new(
        IdentityContext::customer("student-7"),
        Arc::new(InMemorySubscriptionStore::new()),
        Arc::new(TracingChannel::new(Permission::Undetermined, true)),
    );
    dispatcher.toggle_subscription(&order.id, true).await?;
    system.attach_dispatcher(dispatcher).await?;

    let span = tracing::info_span!("kitchen");
    let result = async {
        let mut status = order.status;
        while status != OrderStatus::Ready {
            status = staff.advance_order(order.id.clone()).await?.order.status;
        }

        let board = staff.active_orders().await?;
        info!(board = %serde_json::to_string(&board)?, "Board with order ready");

        staff.advance_order(order.id.clone()).await?;
        let reissued = staff.add_order(CouponNumber(7)).await?;
        info!(order_id = %reissued.id, "Coupon reusable after collection");
        anyhow::Ok(())
    }
    .instrument(span)
    .await;

    if let Err(e) = result {
        error!(error = %e, "Kitchen round failed");
    }

    // Give the dispatcher a moment to drain the feed.
    tokio::time::sleep(Duration::from_millis(50)).await;

    system.shutdown().await?;
    info!("Canteen board stopped");
    Ok(())
}
