use chat_bridge_core::text::Baseline;

use crate::{
    domain::{ActionOutcome, Failure, SkipReason},
    errors::HostError,
    host::{HostTree, NodeId},
};

/// Writes replies into the host's input control.
///
/// After a successful write the baseline is frozen at the chat region's current length
/// and remembers the reply, so the host echoing it into the chat is not mistaken for
/// partner text.
#[derive(Debug, Default)]
pub struct InjectionWriter;

impl InjectionWriter {
    pub fn inject<H: HostTree + ?Sized>(
        &self,
        host: &mut H,
        input: Option<NodeId>,
        chat: Option<NodeId>,
        text: &str,
        baseline: &mut Baseline,
    ) -> ActionOutcome {
        if text.trim().is_empty() {
            return ActionOutcome::Skipped(SkipReason::EmptyText);
        }
        let Some(input) = input else {
            return ActionOutcome::Skipped(SkipReason::NoInputTarget);
        };
        if !host.is_attached(input) {
            return ActionOutcome::Failed(Failure::TargetDetached);
        }

        if let Err(e) = host
            .set_value(input, text)
            .and_then(|()| host.dispatch_input_event(input))
        {
            tracing::warn!(error = ?e, ?input, "input rejected injected text");
            return ActionOutcome::Failed(match e {
                HostError::Detached(_) => Failure::TargetDetached,
                HostError::NotEditable(_) => Failure::HostRejected,
            });
        }

        let chat_len = chat
            .filter(|c| host.is_attached(*c))
            .and_then(|c| host.text_content(c))
            .map_or(baseline.observed_len, |t| t.len());
        baseline.mark_self_authored(chat_len, text);

        tracing::debug!(len = text.len(), observed_len = chat_len, "reply injected");
        ActionOutcome::Applied
    }
}
