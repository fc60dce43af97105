use crate::*;

use std::time::Duration;

/// Dropping a queued admission future mid-sleep gives its reservation
/// back: the cursor returns to its pre-reservation value and the freed
/// capacity is immediately usable by the next caller.
#[tokio::test(start_paused = true)]
async fn cancelled_wait_gives_back_its_reservation() {
    let (clock, pacer) = paced(10.0, 600);
    let orders = ctx("orders");

    assert!(pacer.try_admit(&orders, 5, false).await);
    assert_eq!(pacer.latest_reserved_ms(), T0);
    clock.advance(10);

    // Cancel the queued request partway through its ~490ms sleep.
    tokio::select! {
        admitted = pacer.try_admit(&orders, 5, false) => {
            panic!("admission should have been cancelled, got {admitted}");
        }
        _ = tokio::time::sleep(Duration::from_millis(100)) => {}
    }

    assert_eq!(pacer.latest_reserved_ms(), T0);

    // The freed slot goes to the next caller.
    assert!(pacer.try_admit(&orders, 5, false).await);
    assert_eq!(pacer.latest_reserved_ms(), T0 + 500);
}

/// A request that completes its wait keeps its reservation.
#[tokio::test(start_paused = true)]
async fn completed_wait_keeps_its_reservation() {
    let (clock, pacer) = paced(10.0, 600);
    let orders = ctx("orders");

    assert!(pacer.try_admit(&orders, 5, false).await);
    clock.advance(10);

    tokio::select! {
        admitted = pacer.try_admit(&orders, 5, false) => assert!(admitted),
        _ = tokio::time::sleep(Duration::from_millis(1_000)) => {
            panic!("admission should have completed before the timeout");
        }
    }

    assert_eq!(pacer.latest_reserved_ms(), T0 + 500);
}
