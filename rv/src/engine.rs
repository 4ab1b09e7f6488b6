//! Session engine
//!
//! Drives one elicitation session: scripted intake sequencing, free-form
//! forwarding, file uploads and the executive summary. All operations are
//! strictly sequential; while one is in flight nothing else mutates the
//! session.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use eyre::Result;
use tracing::{debug, warn};

use crate::config::{Config, IngestConfig};
use crate::export::{self, ExportError, ExportFormat};
use crate::ingest;
use crate::intake::{IntakePhase, QUESTIONS};
use crate::llm::{ChatSession, LlmClient};
use crate::prompts::{AudioContext, ClosingContext, DocumentContext, InlineFile, PromptLoader, QuestionContext};
use crate::session::{Attachment, AttachmentKind, AttachmentStatus, ChatMessage, SessionState};

/// Fixed assistant message substituted when a model call fails
pub const ERROR_REPLY: &str = "Lo siento, hubo un error al procesar tu mensaje. Por favor, intenta de nuevo.";

/// Result of processing one uploaded file
#[derive(Debug)]
pub struct UploadOutcome {
    pub id: String,
    pub name: String,
    pub status: AttachmentStatus,
    /// Assistant reply to the automatic analysis prompt, when one was sent
    pub reply: Option<String>,
    /// Human-readable failure description
    pub error: Option<String>,
}

/// One chat session: conversation state plus the model gateway
pub struct Engine {
    chat: ChatSession,
    prompts: PromptLoader,
    pub state: SessionState,
    ingest: IngestConfig,
    export_dir: PathBuf,
}

impl Engine {
    /// Create an engine for a fresh session
    pub fn new(client: Arc<dyn LlmClient>, prompts: PromptLoader, config: &Config) -> Result<Self> {
        let system = prompts.system()?;
        Ok(Self {
            chat: ChatSession::new(client, system, config.llm.max_tokens),
            prompts,
            state: SessionState::new(),
            ingest: config.ingest.clone(),
            export_dir: config.export.directory.clone(),
        })
    }

    /// Open the session with the welcome message and the first question
    ///
    /// Purely local; no model call is made.
    pub fn start(&mut self) -> Result<String> {
        let welcome = self.prompts.welcome(QUESTIONS[0].prompt)?;
        self.state.push_message(ChatMessage::assistant(welcome.clone()));
        Ok(welcome)
    }

    /// Handle one user submission
    ///
    /// Returns the assistant text appended to the log, or `None` when the
    /// submission was empty and carried no ready attachments. Model failures
    /// are absorbed: the fixed apologetic reply is logged and the sequencer
    /// keeps its position so the user can retry.
    pub async fn submit(&mut self, input: &str) -> Result<Option<String>> {
        let trimmed = input.trim().to_string();

        let mut refs = Vec::new();
        let mut files = Vec::new();
        for attachment in self.state.ready_attachments() {
            refs.push(attachment.to_ref());
            let (content, _) = truncate_chars(attachment.content.as_deref().unwrap_or(""), self.ingest.max_inline_chars);
            files.push(InlineFile {
                name: attachment.name.clone(),
                content,
            });
        }

        if trimmed.is_empty() && files.is_empty() {
            debug!("submit: empty submission, ignoring");
            return Ok(None);
        }

        let message_content = if trimmed.is_empty() {
            // Attachment-derived text substitutes as the message body
            self.prompts.inline_files(files)?
        } else if refs.is_empty() {
            trimmed.clone()
        } else {
            let names: Vec<&str> = refs.iter().map(|r| r.name.as_str()).collect();
            format!("{}\n\n[Archivos adjuntos: {}]", trimmed, names.join(", "))
        };

        // The effective answer while sequencing is the typed text, or the
        // attachment-derived body when nothing was typed
        let answer = if trimmed.is_empty() { message_content.clone() } else { trimmed };

        self.state
            .push_message(ChatMessage::user_with_attachments(message_content.clone(), refs));

        match self.state.intake.phase() {
            IntakePhase::Asking(index) if index + 1 < QUESTIONS.len() => {
                let current = QUESTIONS[index];
                let next = QUESTIONS[index + 1];
                let context = self.state.intake.context_block();
                self.state.intake.record_answer(&answer);

                let prompt = self.prompts.next_question(&QuestionContext {
                    context,
                    current_question: current.prompt.to_string(),
                    answer,
                    next_question: next.prompt.to_string(),
                })?;

                match self.chat.send(prompt).await {
                    Ok(text) => {
                        // The fixed question is always asked verbatim, even
                        // when the model paraphrases it away
                        let display = if text.contains(next.prompt) {
                            text
                        } else {
                            format!("**{}**", next.prompt)
                        };
                        self.state.intake.advance();
                        self.state.push_message(ChatMessage::assistant(display.clone()));
                        Ok(Some(display))
                    }
                    Err(e) => Ok(Some(self.push_error_reply(&e.to_string()))),
                }
            }
            IntakePhase::Asking(_) => {
                // Last question answered: close the scripted flow
                let context = self.state.intake.context_block();
                self.state.intake.record_answer(&answer);

                let prompt = self.prompts.closing(&ClosingContext { context, answer })?;

                self.state.intake.begin_summary();
                match self.chat.send(prompt).await {
                    Ok(text) => {
                        self.state.intake.finish();
                        self.state.push_message(ChatMessage::assistant(text.clone()));
                        Ok(Some(text))
                    }
                    Err(e) => {
                        self.state.intake.abort_summary();
                        Ok(Some(self.push_error_reply(&e.to_string())))
                    }
                }
            }
            IntakePhase::Summarizing | IntakePhase::FreeForm => match self.chat.send(message_content).await {
                Ok(text) => {
                    self.state.push_message(ChatMessage::assistant(text.clone()));
                    Ok(Some(text))
                }
                Err(e) => Ok(Some(self.push_error_reply(&e.to_string()))),
            },
        }
    }

    /// Process uploads one at a time, strictly sequentially
    ///
    /// Each file runs extraction, message append and model round-trip to
    /// completion before the next file starts.
    pub async fn upload(&mut self, paths: &[PathBuf]) -> Result<Vec<UploadOutcome>> {
        let mut outcomes = Vec::with_capacity(paths.len());
        for path in paths {
            outcomes.push(self.upload_one(path).await?);
        }
        Ok(outcomes)
    }

    async fn upload_one(&mut self, path: &Path) -> Result<UploadOutcome> {
        let kind = ingest::classify(path);
        let size = tokio::fs::metadata(path).await.map(|m| m.len()).unwrap_or(0);

        let mut attachment = Attachment::new(path, kind, size);
        let id = attachment.id.clone();
        let name = attachment.name.clone();
        self.state.add_attachment(attachment.clone());
        debug!(%id, %name, ?kind, "upload_one: processing");

        let content = match ingest::extract(path, kind, size, &self.ingest).await {
            Ok(content) => content,
            Err(e) => {
                warn!(%name, error = %e, "upload_one: extraction failed");
                self.mark_attachment_error(&id);
                return Ok(UploadOutcome {
                    id,
                    name,
                    status: AttachmentStatus::Error,
                    reply: None,
                    error: Some(e.to_string()),
                });
            }
        };

        attachment.content = Some(content.clone());
        attachment.status = AttachmentStatus::Ready;
        if let Some(stored) = self.state.attachment_mut(&id) {
            *stored = attachment.clone();
        }

        let prompt = match kind {
            AttachmentKind::Document => {
                let (capped, truncated) = truncate_chars(&content, self.ingest.max_document_chars);
                self.prompts.document(&DocumentContext {
                    name: name.clone(),
                    content: capped,
                    truncated,
                })?
            }
            AttachmentKind::Audio => self.prompts.audio(&AudioContext {
                name: name.clone(),
                size_mb: ingest::size_mb(size),
            })?,
        };

        self.state
            .push_message(ChatMessage::user_with_attachments(prompt.clone(), vec![attachment.to_ref()]));

        match self.chat.send(prompt).await {
            Ok(text) => {
                self.state.push_message(ChatMessage::assistant(text.clone()));
                Ok(UploadOutcome {
                    id,
                    name,
                    status: AttachmentStatus::Ready,
                    reply: Some(text),
                    error: None,
                })
            }
            Err(e) => {
                warn!(%name, error = %e, "upload_one: model call failed");
                self.mark_attachment_error(&id);
                Ok(UploadOutcome {
                    id,
                    name,
                    status: AttachmentStatus::Error,
                    reply: None,
                    error: Some(e.to_string()),
                })
            }
        }
    }

    /// Mark a stored attachment as failed
    fn mark_attachment_error(&mut self, id: &str) {
        if let Some(stored) = self.state.attachment_mut(id) {
            stored.status = AttachmentStatus::Error;
        }
    }

    /// Request the executive requirements summary
    ///
    /// No-op below two messages. A model failure is logged and inserts
    /// nothing into the conversation.
    pub async fn generate_summary(&mut self) -> Result<Option<String>> {
        if self.state.message_count() < 2 {
            debug!("generate_summary: too few messages, skipping");
            return Ok(None);
        }

        let prompt = self.prompts.executive_summary()?;
        match self.chat.send(prompt).await {
            Ok(text) => {
                let content = format!("## 📊 RESUMEN EJECUTIVO DE REQUISITOS\n\n{}", text);
                self.state.push_message(ChatMessage::assistant(content.clone()));
                Ok(Some(content))
            }
            Err(e) => {
                warn!(error = %e, "generate_summary: model call failed");
                Ok(None)
            }
        }
    }

    /// Export the session to the configured directory
    pub fn export(&self, format: ExportFormat) -> Result<PathBuf, ExportError> {
        export::export(&self.state, format, &self.export_dir)
    }

    fn push_error_reply(&mut self, error: &str) -> String {
        warn!(%error, "model call failed, substituting error reply");
        self.state.push_message(ChatMessage::assistant(ERROR_REPLY));
        ERROR_REPLY.to_string()
    }
}

/// Cap a string at `max` chars on a character boundary
fn truncate_chars(s: &str, max: usize) -> (String, bool) {
    match s.char_indices().nth(max) {
        Some((idx, _)) => (s[..idx].to_string(), true),
        None => (s.to_string(), false),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::intake::QUESTIONS;
    use crate::llm::client::mock::MockLlmClient;
    use crate::llm::{CompletionResponse, FinishReason, TokenUsage};
    use crate::session::Role;
    use std::io::Write;

    fn engine_with(mock: &Arc<MockLlmClient>) -> Engine {
        let client: Arc<dyn crate::llm::LlmClient> = mock.clone();
        Engine::new(client, PromptLoader::new(None), &Config::default()).unwrap()
    }

    fn ok_response(text: &str) -> Result<CompletionResponse, String> {
        Ok(CompletionResponse {
            text: Some(text.to_string()),
            finish_reason: FinishReason::Stop,
            usage: TokenUsage::default(),
        })
    }

    #[test]
    fn test_truncate_chars_on_boundaries() {
        assert_eq!(truncate_chars("hola", 10), ("hola".to_string(), false));
        assert_eq!(truncate_chars("hola", 4), ("hola".to_string(), false));
        assert_eq!(truncate_chars("holas", 4), ("hola".to_string(), true));
        // Multi-byte chars must not split
        assert_eq!(truncate_chars("ñandú", 3), ("ñan".to_string(), true));
    }

    #[tokio::test]
    async fn test_start_asks_first_question_without_model_call() {
        let mock = Arc::new(MockLlmClient::with_texts(vec![]));
        let mut engine = engine_with(&mock);

        let welcome = engine.start().unwrap();
        assert!(welcome.contains(QUESTIONS[0].prompt));
        assert_eq!(engine.state.message_count(), 1);
        assert_eq!(mock.call_count(), 0);
    }

    #[tokio::test]
    async fn test_empty_submission_is_ignored() {
        let mock = Arc::new(MockLlmClient::with_texts(vec![]));
        let mut engine = engine_with(&mock);

        assert!(engine.submit("   ").await.unwrap().is_none());
        assert_eq!(engine.state.message_count(), 0);
        assert_eq!(mock.call_count(), 0);
    }

    #[tokio::test]
    async fn test_verbatim_substitution_when_model_drops_question() {
        let mock = Arc::new(MockLlmClient::with_texts(vec!["Entiendo, gracias por el detalle."]));
        let mut engine = engine_with(&mock);

        let reply = engine.submit("una app de turnos").await.unwrap().unwrap();
        assert_eq!(reply, format!("**{}**", QUESTIONS[1].prompt));
        assert_eq!(engine.state.intake.phase(), IntakePhase::Asking(1));
    }

    #[tokio::test]
    async fn test_model_phrasing_kept_when_it_contains_question() {
        let phrased = format!("¡Excelente! Sigamos: {}", QUESTIONS[1].prompt);
        let mock = Arc::new(MockLlmClient::with_texts(vec![phrased.as_str()]));
        let mut engine = engine_with(&mock);

        let reply = engine.submit("una app de turnos").await.unwrap().unwrap();
        assert_eq!(reply, phrased);
    }

    #[tokio::test]
    async fn test_context_prompt_carries_prior_answers() {
        let mock = Arc::new(MockLlmClient::with_texts(vec!["r1", "r2"]));
        let mut engine = engine_with(&mock);

        engine.submit("primera respuesta").await.unwrap();
        engine.submit("segunda respuesta").await.unwrap();

        let requests = mock.requests();
        let second_prompt = &requests[1].turns.last().unwrap().text;
        assert!(second_prompt.contains("primera respuesta"));
        assert!(second_prompt.contains(&format!("Respuesta actual a la pregunta \"{}\"", QUESTIONS[1].prompt)));
        assert!(second_prompt.contains(&format!("Ahora haz la siguiente pregunta: \"{}\"", QUESTIONS[2].prompt)));
    }

    #[tokio::test]
    async fn test_full_intake_never_skips_and_ends_free_form() {
        // Model always echoes the expected next question; last call is the
        // closing summary
        let texts: Vec<String> = QUESTIONS[1..]
            .iter()
            .map(|q| q.prompt.to_string())
            .chain(std::iter::once("Resumen de lo conversado".to_string()))
            .collect();
        let mock = Arc::new(MockLlmClient::with_texts(texts.iter().map(String::as_str).collect()));
        let mut engine = engine_with(&mock);

        for n in 0..QUESTIONS.len() {
            engine.submit(&format!("respuesta {}", n)).await.unwrap();
        }

        assert_eq!(engine.state.intake.phase(), IntakePhase::FreeForm);
        let answers = engine.state.intake.answers();
        assert_eq!(answers.len(), QUESTIONS.len());
        for (answer, question) in answers.iter().zip(QUESTIONS.iter()) {
            assert_eq!(answer.question_id, question.id);
        }

        // Free-form mode forwards input verbatim, permanently
        engine.submit("¿algo más que definir?").await.unwrap();
        let requests = mock.requests();
        assert_eq!(
            requests.last().unwrap().turns.last().unwrap().text,
            "¿algo más que definir?"
        );
        assert_eq!(engine.state.intake.phase(), IntakePhase::FreeForm);
    }

    #[tokio::test]
    async fn test_model_failure_keeps_sequencer_position() {
        let mock = Arc::new(MockLlmClient::new(vec![
            Err("boom".to_string()),
            ok_response(QUESTIONS[1].prompt),
        ]));
        let mut engine = engine_with(&mock);

        let reply = engine.submit("mi respuesta").await.unwrap().unwrap();
        assert_eq!(reply, ERROR_REPLY);
        assert_eq!(engine.state.intake.phase(), IntakePhase::Asking(0));
        assert_eq!(engine.state.intake.answers().len(), 1);
        assert_eq!(engine.state.messages().last().unwrap().content, ERROR_REPLY);

        // Retry succeeds and advances without duplicating the answer
        engine.submit("mi respuesta otra vez").await.unwrap();
        assert_eq!(engine.state.intake.phase(), IntakePhase::Asking(1));
        assert_eq!(engine.state.intake.answers().len(), 1);
        assert_eq!(engine.state.intake.answers()[0].text, "mi respuesta otra vez");
    }

    #[tokio::test]
    async fn test_closing_failure_allows_retry() {
        let mut responses: Vec<Result<CompletionResponse, String>> =
            QUESTIONS[1..].iter().map(|q| ok_response(q.prompt)).collect();
        responses.push(Err("boom".to_string()));
        responses.push(ok_response("Resumen final"));
        let mock = Arc::new(MockLlmClient::new(responses));
        let mut engine = engine_with(&mock);

        for n in 0..QUESTIONS.len() {
            engine.submit(&format!("respuesta {}", n)).await.unwrap();
        }
        // Closing call failed: still on the last question
        assert!(engine.state.intake.on_last_question());

        let reply = engine.submit("última, ahora sí").await.unwrap().unwrap();
        assert_eq!(reply, "Resumen final");
        assert_eq!(engine.state.intake.phase(), IntakePhase::FreeForm);
    }

    #[tokio::test]
    async fn test_empty_input_with_ready_attachment_is_accepted() {
        let mut file = tempfile::Builder::new().suffix(".txt").tempfile().unwrap();
        write!(file, "el presupuesto es de 10000").unwrap();

        let mock = Arc::new(MockLlmClient::with_texts(vec!["analizado", QUESTIONS[1].prompt]));
        let mut engine = engine_with(&mock);

        let outcomes = engine.upload(&[file.path().to_path_buf()]).await.unwrap();
        assert_eq!(outcomes[0].status, AttachmentStatus::Ready);

        let reply = engine.submit("").await.unwrap();
        assert!(reply.is_some());

        // The attachment-derived body substitutes for the typed answer
        let user_message = &engine.state.messages()[engine.state.message_count() - 2];
        assert_eq!(user_message.role, Role::User);
        assert!(user_message.content.starts_with("Analiza los siguientes archivos"));
        assert!(user_message.content.contains("el presupuesto es de 10000"));
        assert_eq!(user_message.attachments.len(), 1);
    }

    #[tokio::test]
    async fn test_attachment_names_appended_to_typed_input() {
        let mut file = tempfile::Builder::new().suffix(".md").tempfile().unwrap();
        write!(file, "notas de la reunión").unwrap();

        let mock = Arc::new(MockLlmClient::with_texts(vec!["analizado", QUESTIONS[1].prompt]));
        let mut engine = engine_with(&mock);
        engine.upload(&[file.path().to_path_buf()]).await.unwrap();

        engine.submit("un portal de clientes").await.unwrap();
        let user_message = &engine.state.messages()[engine.state.message_count() - 2];
        assert!(user_message.content.starts_with("un portal de clientes"));
        assert!(user_message.content.contains("[Archivos adjuntos: "));

        // The recorded answer stays the typed text only
        assert_eq!(engine.state.intake.answers()[0].text, "un portal de clientes");
    }

    #[tokio::test]
    async fn test_unsupported_upload_leaves_log_unchanged() {
        let mock = Arc::new(MockLlmClient::with_texts(vec![]));
        let mut engine = engine_with(&mock);
        engine.start().unwrap();
        let before = engine.state.message_count();

        let outcomes = engine.upload(&[PathBuf::from("instalador.exe")]).await.unwrap();

        assert_eq!(outcomes.len(), 1);
        assert_eq!(outcomes[0].status, AttachmentStatus::Error);
        assert!(outcomes[0].error.as_deref().unwrap().contains("exe"));
        assert_eq!(engine.state.message_count(), before);
        assert_eq!(mock.call_count(), 0);
        assert_eq!(engine.state.attachments()[0].status, AttachmentStatus::Error);
    }

    #[tokio::test]
    async fn test_document_upload_round_trip() {
        let mut file = tempfile::Builder::new().suffix(".txt").tempfile().unwrap();
        write!(file, "el plazo es el 30 de junio").unwrap();

        let mock = Arc::new(MockLlmClient::with_texts(vec!["He identificado el plazo de entrega final"]));
        let mut engine = engine_with(&mock);
        engine.start().unwrap();

        let outcomes = engine.upload(&[file.path().to_path_buf()]).await.unwrap();
        assert_eq!(outcomes[0].status, AttachmentStatus::Ready);
        assert_eq!(outcomes[0].reply.as_deref(), Some("He identificado el plazo de entrega final"));

        // welcome + analysis prompt + assistant reply
        assert_eq!(engine.state.message_count(), 3);
        let prompt = &engine.state.messages()[1];
        assert!(prompt.content.contains("He subido un documento llamado"));
        assert!(prompt.content.contains("el plazo es el 30 de junio"));
        assert_eq!(prompt.attachments[0].status, AttachmentStatus::Ready);

        // The tagger saw the new assistant text
        assert!(engine.state.status().plazos);
    }

    #[tokio::test]
    async fn test_audio_upload_sends_placeholder_prompt() {
        let mut file = tempfile::Builder::new().suffix(".mp3").tempfile().unwrap();
        file.write_all(&[0u8; 2048]).unwrap();

        let mock = Arc::new(MockLlmClient::with_texts(vec!["no puedo escuchar, describe el audio"]));
        let mut engine = engine_with(&mock);
        engine.start().unwrap();

        let outcomes = engine.upload(&[file.path().to_path_buf()]).await.unwrap();
        assert_eq!(outcomes[0].status, AttachmentStatus::Ready);

        let prompt = &engine.state.messages()[1];
        assert!(prompt.content.contains("He subido un archivo de audio llamado"));
        assert!(prompt.content.contains("MB"));
        // Placeholder text, never decoded audio, is what got extracted
        let attachment = &engine.state.attachments()[0];
        assert!(attachment.content.as_deref().unwrap().starts_with("[Archivo de audio:"));
    }

    #[tokio::test]
    async fn test_summary_requires_two_messages() {
        let mock = Arc::new(MockLlmClient::with_texts(vec!["no debería llamarse"]));
        let mut engine = engine_with(&mock);
        engine.start().unwrap();

        assert!(engine.generate_summary().await.unwrap().is_none());
        assert_eq!(mock.call_count(), 0);
    }

    #[tokio::test]
    async fn test_summary_appends_headed_message() {
        let mock = Arc::new(MockLlmClient::with_texts(vec![QUESTIONS[1].prompt, "1. Resumen general"]));
        let mut engine = engine_with(&mock);
        engine.start().unwrap();
        engine.submit("una app de turnos").await.unwrap();

        let summary = engine.generate_summary().await.unwrap().unwrap();
        assert!(summary.starts_with("## 📊 RESUMEN EJECUTIVO DE REQUISITOS"));
        assert!(summary.contains("1. Resumen general"));
        assert_eq!(engine.state.messages().last().unwrap().role, Role::Assistant);
    }

    #[tokio::test]
    async fn test_summary_failure_inserts_nothing() {
        let mock = Arc::new(MockLlmClient::new(vec![
            ok_response(QUESTIONS[1].prompt),
            Err("boom".to_string()),
        ]));
        let mut engine = engine_with(&mock);
        engine.start().unwrap();
        engine.submit("una app de turnos").await.unwrap();
        let before = engine.state.message_count();

        assert!(engine.generate_summary().await.unwrap().is_none());
        assert_eq!(engine.state.message_count(), before);
    }
}
