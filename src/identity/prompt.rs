//! Terminal consent flow
//!
//! Asks the operator to paste an ID token issued by the federated provider.
//! An empty line or end of input counts as declining.

use async_trait::async_trait;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader, Stdin, Stdout};
use tokio::sync::Mutex;

use super::provider::{ConsentFlow, FederatedCredential};
use crate::types::Result;

pub struct PromptConsent<R, W> {
    input: Mutex<R>,
    output: Mutex<W>,
}

impl PromptConsent<BufReader<Stdin>, Stdout> {
    pub fn stdio() -> Self {
        Self::new(BufReader::new(tokio::io::stdin()), tokio::io::stdout())
    }
}

impl<R, W> PromptConsent<R, W>
where
    R: AsyncBufRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    pub fn new(input: R, output: W) -> Self {
        Self {
            input: Mutex::new(input),
            output: Mutex::new(output),
        }
    }
}

#[async_trait]
impl<R, W> ConsentFlow for PromptConsent<R, W>
where
    R: AsyncBufRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    async fn obtain_credential(&self, provider_id: &str) -> Result<Option<FederatedCredential>> {
        {
            let mut output = self.output.lock().await;
            output
                .write_all(
                    format!(
                        "Paste the {} ID token (leave empty to cancel): ",
                        provider_id
                    )
                    .as_bytes(),
                )
                .await?;
            output.flush().await?;
        }

        let mut line = String::new();
        self.input.lock().await.read_line(&mut line).await?;

        let token = line.trim();
        if token.is_empty() {
            return Ok(None);
        }

        Ok(Some(FederatedCredential {
            id_token: token.to_string(),
            provider_id: provider_id.to_string(),
        }))
    }
}
