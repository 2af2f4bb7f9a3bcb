// SPDX-FileCopyrightText: Copyright (c) 2025-2026 NVIDIA CORPORATION & AFFILIATES. All rights reserved.
// SPDX-License-Identifier: Apache-2.0

//! Event gate and event-to-stream bridge scenarios.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use futures::StreamExt;
use parking_lot::Mutex;
use revq::{event_iterable, event_state, Error, EventBus, Listener, Segment};
use tokio::time::timeout;

async fn delay(ms: u64) {
    tokio::time::sleep(Duration::from_millis(ms)).await;
}

fn segment(
    bus: &Arc<EventBus<()>>,
    activate: &[&str],
    deactivate: &[&str],
    status: bool,
) -> Segment<()> {
    Segment::new(
        Arc::clone(bus) as Arc<dyn Listener<()>>,
        activate.iter().copied(),
        deactivate.iter().copied(),
        status,
    )
}

#[tokio::test(start_paused = true)]
async fn gate_resolves_when_all_segments_align() -> Result<()> {
    let buses: Vec<Arc<EventBus<()>>> = (0..3).map(|_| EventBus::new()).collect();
    let gate = event_state(vec![
        segment(&buses[0], &["yes", "yep"], &["no"], false),
        segment(&buses[1], &["yes"], &["no", "nope"], true),
        segment(&buses[2], &["yes"], &["no"], false),
    ]);

    let journal = Arc::new(Mutex::new(Vec::new()));
    tokio::spawn({
        let buses = buses.clone();
        let journal = Arc::clone(&journal);
        async move {
            delay(50).await;
            journal.lock().push("one");
            buses[0].emit("yes", ());

            delay(50).await;
            journal.lock().push("two");
            buses[1].emit("nope", ());

            delay(50).await;
            journal.lock().push("three");
            buses[2].emit("yes", ());

            delay(50).await;
            journal.lock().push("four");
            buses[0].emit("no", ());
            buses[1].emit("yes", ());

            delay(50).await;
            journal.lock().push("five");
            buses[1].emit("no", ());
            buses[1].emit("yes", ());

            delay(50).await;
            journal.lock().push("six");
            buses[0].emit("yep", ());

            delay(50).await;
            journal.lock().push("nope");
        }
    });

    timeout(Duration::from_millis(1000), gate.wait()).await??;
    assert_eq!(
        *journal.lock(),
        vec!["one", "two", "three", "four", "five", "six"]
    );
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn cancelled_gate_fails_while_its_twin_still_resolves() -> Result<()> {
    let buses: Vec<Arc<EventBus<()>>> = (0..3).map(|_| EventBus::new()).collect();
    let segments = |buses: &[Arc<EventBus<()>>]| {
        vec![
            segment(&buses[0], &["yes"], &["no"], false),
            segment(&buses[1], &["yes"], &["no"], true),
            segment(&buses[2], &["yes"], &["no"], false),
        ]
    };

    let gate1 = event_state(segments(&buses));
    let cancel1 = gate1.cancel_handle();
    let gate2 = event_state(segments(&buses));
    let cancel2 = gate2.cancel_handle();

    let journal = Arc::new(Mutex::new(Vec::new()));
    tokio::spawn({
        let buses = buses.clone();
        let journal = Arc::clone(&journal);
        async move {
            delay(50).await;
            journal.lock().push("one");
            buses[0].emit("yes", ());

            delay(50).await;
            journal.lock().push("two");
            buses[1].emit("no", ());

            delay(50).await;
            journal.lock().push("three");
            buses[2].emit("yes", ());
            cancel1.cancel();

            delay(50).await;
            journal.lock().push("four");
            buses[0].emit("no", ());
            buses[1].emit("yes", ());

            delay(50).await;
            journal.lock().push("five");
            buses[1].emit("yes", ());

            delay(50).await;
            journal.lock().push("six");
            buses[0].emit("yes", ());

            // By now the second gate has resolved; cancelling is a no-op.
            delay(1).await;
            cancel2.cancel();

            delay(50).await;
            journal.lock().push("nope");
        }
    });

    let first = timeout(Duration::from_millis(1000), gate1.wait()).await?;
    assert_eq!(first, Err(Error::Cancelled));
    journal.lock().push("seven");

    let second = timeout(Duration::from_millis(1000), gate2.wait()).await?;
    assert_eq!(second, Ok(()));

    assert_eq!(
        *journal.lock(),
        vec!["one", "two", "three", "seven", "four", "five", "six"]
    );
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn bridge_streams_payloads_until_closed() -> Result<()> {
    let bus: Arc<EventBus<&'static str>> = EventBus::new();
    let mut events = event_iterable(Arc::clone(&bus) as Arc<dyn Listener<&'static str>>, "hello");
    let handle = events.close_handle();

    let producer = tokio::spawn({
        let bus = Arc::clone(&bus);
        async move {
            delay(50).await;
            bus.emit("hello", "one");

            delay(50).await;
            bus.emit("hello", "two");

            delay(50).await;
            bus.emit("hello", "three");

            delay(50).await;
            handle.close();
            bus.emit("hello", "four");
        }
    });

    let mut observed = Vec::new();
    while let Some(value) = events.next().await {
        observed.push(value);
    }

    assert_eq!(observed, vec!["one", "two", "three"]);
    producer.await?;
    assert_eq!(bus.subscriber_count("hello"), 0);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn bridge_consumer_can_stop_early() -> Result<()> {
    let bus: Arc<EventBus<&'static str>> = EventBus::new();
    let mut events = event_iterable(Arc::clone(&bus) as Arc<dyn Listener<&'static str>>, "hello");

    let producer = tokio::spawn({
        let bus = Arc::clone(&bus);
        async move {
            for value in ["one", "two", "three", "four"] {
                delay(50).await;
                bus.emit("hello", value);
            }
        }
    });

    let mut observed = Vec::new();
    while let Some(value) = events.next().await {
        observed.push(value);
        if observed.len() == 3 {
            break;
        }
    }
    drop(events);

    assert_eq!(observed, vec!["one", "two", "three"]);
    producer.await?;
    assert_eq!(bus.subscriber_count("hello"), 0);
    Ok(())
}
