use std::sync::mpsc;
use std::time::Duration;

use crate::analysis::{AnalysisClient, AnalysisError, AnalysisResult, GeminiTransport, ScouterResult};
use crate::state::AnalysisTicket;

pub(super) const ACTION_RESULT_POLL_INTERVAL: Duration = Duration::from_millis(24);

pub(super) fn spawn_worker_action<T, W, H>(work: W, mut on_result: H)
where
    T: Send + 'static,
    W: FnOnce() -> T + Send + 'static,
    H: FnMut(T) + 'static,
{
    let (tx, rx) = mpsc::channel::<T>();
    std::thread::spawn(move || {
        let result = work();
        let _ = tx.send(result);
    });

    gtk4::glib::timeout_add_local(ACTION_RESULT_POLL_INTERVAL, move || match rx.try_recv() {
        Ok(result) => {
            on_result(result);
            gtk4::glib::ControlFlow::Break
        }
        Err(mpsc::TryRecvError::Empty) => gtk4::glib::ControlFlow::Continue,
        Err(mpsc::TryRecvError::Disconnected) => gtk4::glib::ControlFlow::Break,
    });
}

/// Endpoint settings copied into each worker thread.
#[derive(Debug, Clone)]
pub(super) struct AnalysisSettings {
    pub(super) api_base: Option<String>,
    pub(super) timeout: Duration,
    pub(super) fallback_api_key: Option<String>,
}

/// Blocking analysis call for a worker thread.
pub(super) fn run_analysis(
    settings: &AnalysisSettings,
    ticket: &AnalysisTicket,
) -> AnalysisResult<ScouterResult> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|err| AnalysisError::Transport {
            message: format!("failed to start async runtime: {err}"),
        })?;
    let transport = GeminiTransport::new(settings.api_base.clone(), settings.timeout)?;
    let client = AnalysisClient::new(transport, settings.fallback_api_key.clone());

    runtime.block_on(client.analyze(
        &ticket.image,
        &ticket.model,
        ticket.language,
        &ticket.api_key,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::acquisition::ImagePayload;
    use crate::analysis;
    use crate::i18n::Language;

    #[test]
    fn missing_credential_fails_before_any_request() {
        let settings = AnalysisSettings {
            api_base: Some("http://127.0.0.1:9".to_string()),
            timeout: Duration::from_secs(1),
            fallback_api_key: None,
        };
        let ticket = AnalysisTicket {
            generation: 1,
            image: ImagePayload::new(vec![0xff, 0xd8, 0xff, 0xd9], "image/jpeg").unwrap(),
            model: analysis::default_model(),
            language: Language::English,
            api_key: "   ".to_string(),
        };
        assert!(matches!(
            run_analysis(&settings, &ticket),
            Err(AnalysisError::MissingCredential)
        ));
    }
}
