//! Realtime pacing on top of tokio's timer
//!
//! The virtual clock normally jumps straight to the next due job. These
//! helpers sleep for the virtual gap first, so a replay unfolds at
//! wall-clock speed. Simulated blocking costs are not slept.

use std::time::Duration;

use tracing::{trace, warn};

use super::{earliest, Cooperative, RunLoop, MAX_STEPS_PER_DRAIN};
use crate::clock::as_millis_u64;

/// Like [`RunLoop::advance`], sleeping through each gap
pub async fn pace(run_loop: &RunLoop, by: Duration, sources: &mut [&mut dyn Cooperative]) -> usize {
    let clock = run_loop.clock();
    let target = clock.after(by);
    let mut ran = 0;

    while ran < MAX_STEPS_PER_DRAIN {
        let Some((idx, due)) = earliest(sources) else {
            break;
        };
        if due > target {
            break;
        }
        let gap = due.saturating_sub(clock.now());
        if !gap.is_zero() {
            trace!(gap_ms = as_millis_u64(gap), "pacing to next job");
            tokio::time::sleep(gap).await;
        }
        sources[idx].run_next();
        ran += 1;
    }
    if ran == MAX_STEPS_PER_DRAIN {
        warn!(ran, "realtime pacing hit its step limit while advancing");
    }

    let rest = target.saturating_sub(clock.now());
    if !rest.is_zero() {
        tokio::time::sleep(rest).await;
    }
    clock.advance_to(target);
    ran
}

/// Like [`RunLoop::run_until_idle`], sleeping through each gap
pub async fn pace_until_idle(run_loop: &RunLoop, sources: &mut [&mut dyn Cooperative]) -> usize {
    let clock = run_loop.clock();
    let mut ran = 0;

    while ran < MAX_STEPS_PER_DRAIN {
        let Some((idx, due)) = earliest(sources) else {
            break;
        };
        let gap = due.saturating_sub(clock.now());
        if !gap.is_zero() {
            tokio::time::sleep(gap).await;
        }
        sources[idx].run_next();
        ran += 1;
    }
    if ran == MAX_STEPS_PER_DRAIN {
        warn!(ran, "realtime pacing hit its step limit while draining");
    }
    ran
}
