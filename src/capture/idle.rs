//! The debounce at the heart of the snapshot writer.

use std::time::Duration;

use futures::{Stream, StreamExt};
use tokio::time::{sleep, Instant};

use super::record::{NetworkEvent, ResourceLog};

/// Drain `events` into `log` until a full quiet period passes with none.
///
/// At most one flush deadline is pending at any time; every event replaces
/// it with `now + quiet`. Entering the loop counts as the initial activity
/// event (load success), so a page producing zero resources still settles
/// one quiet period later. Returns early if the stream ends — the browser
/// is gone and nothing more can arrive.
pub(crate) async fn settle<S>(mut events: S, quiet: Duration, log: &mut ResourceLog)
where
    S: Stream<Item = NetworkEvent> + Unpin,
{
    let deadline = sleep(quiet);
    tokio::pin!(deadline);

    loop {
        tokio::select! {
            event = events.next() => match event {
                Some(event) => {
                    log.apply(event);
                    deadline.as_mut().reset(Instant::now() + quiet);
                }
                None => break,
            },
            _ = &mut deadline => break,
        }
    }
}
