use anyhow::{Result, bail};

use super::{cancel_on_ctrl_c, finish_turn, print_updates};
use crate::coach::{CoachSession, TurnOutcome};

pub async fn run(mut session: CoachSession, message: &str) -> Result<()> {
    let (cancel, ctrl_c) = cancel_on_ctrl_c();
    let outcome = session.send(message, cancel, print_updates()).await;
    ctrl_c.abort();
    finish_turn(&outcome);

    if let TurnOutcome::Notice(err) = outcome {
        bail!(err);
    }
    Ok(())
}
