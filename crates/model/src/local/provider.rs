//! Generator implementation for the local provider.

use super::Local;
use pcore::{Error, Generation, Generator, Request, Result, STREAM_BUFFER, token_channel};

impl Generator for Local {
    fn is_available(&self) -> bool {
        self.session.is_some()
    }

    async fn generate(&self, request: &Request) -> Result<Generation> {
        let Some(session) = self.session.clone() else {
            return Err(Error::config("no local model is loaded"));
        };

        let messages = request.messages();
        let sampling = self.sampling;
        let (sink, fragments) = token_channel(STREAM_BUFFER);
        let worker = std::thread::Builder::new()
            .name("local-generation".into())
            .spawn(move || {
                let result =
                    session.generate(&messages, &sampling, &mut |token: String| sink.push(token));
                if let Err(e) = result {
                    tracing::error!("local generation failed: {e}");
                    sink.fail(e);
                }
            })
            .map_err(|e| Error::generation(format!("failed to spawn worker: {e}")))?;

        Ok(Generation::new(fragments).with_worker(worker))
    }
}
