//! Interactive REPL session

use std::path::PathBuf;

use colored::Colorize;
use eyre::Result;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;

use crate::engine::Engine;
use crate::export::ExportFormat;
use crate::session::{AttachmentStatus, Role};

/// Interactive elicitation session over the terminal
pub struct ReplSession {
    engine: Engine,
}

impl ReplSession {
    pub fn new(engine: Engine) -> Self {
        Self { engine }
    }

    /// Run the REPL main loop
    pub async fn run(&mut self, initial: Option<String>) -> Result<()> {
        self.print_welcome();

        let opening = self.engine.start()?;
        println!("{}\n", opening);

        // If an initial message was provided on the command line, process it first
        if let Some(message) = initial {
            println!("{} {}", ">".bright_green(), message);
            self.process_user_input(&message).await?;
        }

        let mut rl = DefaultEditor::new().map_err(|e| eyre::eyre!("Failed to initialize readline: {}", e))?;

        loop {
            let readline = rl.readline(&self.prompt());

            match readline {
                Ok(line) => {
                    let input = line.trim();
                    if input.is_empty() {
                        continue;
                    }

                    let _ = rl.add_history_entry(input);

                    if input.starts_with('/') {
                        match self.handle_slash_command(input).await {
                            SlashResult::Continue => continue,
                            SlashResult::Quit => break,
                        }
                    } else {
                        self.process_user_input(input).await?;
                    }
                }
                Err(ReadlineError::Interrupted) => {
                    // Ctrl+C - just show a new prompt
                    println!("^C");
                    continue;
                }
                Err(ReadlineError::Eof) => {
                    // Ctrl+D - exit
                    println!();
                    break;
                }
                Err(err) => {
                    return Err(eyre::eyre!("Readline error: {}", err));
                }
            }
        }

        println!("¡Hasta luego!");
        Ok(())
    }

    /// Readline prompt, showing intake progress while the scripted flow runs
    fn prompt(&self) -> String {
        match self.engine.state.intake.progress() {
            Some((current, total)) => format!("{} {} ", format!("[Pregunta {} de {}]", current, total).dimmed(), ">".bright_green()),
            None => format!("{} ", ">".bright_green()),
        }
    }

    fn print_welcome(&self) {
        println!();
        println!("{}", "Relevo - Asistente de Relevamiento de Requisitos".bright_cyan().bold());
        println!(
            "Escribe {} para ver los comandos, {} para salir",
            "/ayuda".yellow(),
            "/salir".yellow()
        );
        println!();
    }

    /// Send one user message through the engine and print the reply
    async fn process_user_input(&mut self, input: &str) -> Result<()> {
        match self.engine.submit(input).await? {
            Some(reply) => {
                println!("\n{}\n", reply);
            }
            None => {
                println!("{}", "Escribe un mensaje o sube un archivo con /subir.".dimmed());
            }
        }
        Ok(())
    }

    /// Handle slash commands
    async fn handle_slash_command(&mut self, input: &str) -> SlashResult {
        let parts: Vec<&str> = input.split_whitespace().collect();
        let cmd = parts.first().copied().unwrap_or("");

        match cmd {
            "/ayuda" | "/help" | "/h" => {
                self.print_help();
                SlashResult::Continue
            }
            "/salir" | "/quit" | "/q" => SlashResult::Quit,
            "/subir" => {
                if parts.len() < 2 {
                    println!("Uso: {} <ruta> [ruta...]", "/subir".yellow());
                } else {
                    let paths: Vec<PathBuf> = parts[1..].iter().map(PathBuf::from).collect();
                    self.upload(&paths).await;
                }
                SlashResult::Continue
            }
            "/archivos" => {
                self.print_attachments();
                SlashResult::Continue
            }
            "/quitar" => {
                match parts.get(1) {
                    Some(target) => self.remove_attachment(target),
                    None => println!("Uso: {} <nombre o id>", "/quitar".yellow()),
                }
                SlashResult::Continue
            }
            "/resumen" => {
                self.summary().await;
                SlashResult::Continue
            }
            "/exportar" => {
                self.export(parts.get(1).copied());
                SlashResult::Continue
            }
            "/estado" => {
                self.print_status();
                SlashResult::Continue
            }
            "/historial" => {
                self.print_history();
                SlashResult::Continue
            }
            _ => {
                println!("{} Comando desconocido: {}", "?".yellow(), cmd);
                println!("Escribe {} para ver los comandos disponibles", "/ayuda".yellow());
                SlashResult::Continue
            }
        }
    }

    fn print_help(&self) {
        println!();
        println!("{}", "Comandos disponibles:".bright_cyan());
        println!("  {:24} Muestra esta ayuda", "/ayuda".yellow());
        println!("  {:24} Termina la sesión", "/salir".yellow());
        println!("  {:24} Sube uno o más archivos", "/subir <ruta>...".yellow());
        println!("  {:24} Lista los archivos subidos", "/archivos".yellow());
        println!("  {:24} Quita un archivo subido", "/quitar <nombre>".yellow());
        println!("  {:24} Genera el resumen ejecutivo", "/resumen".yellow());
        println!("  {:24} Exporta la sesión", "/exportar <json|md>".yellow());
        println!("  {:24} Muestra la completitud por categoría", "/estado".yellow());
        println!("  {:24} Muestra la conversación", "/historial".yellow());
        println!();
    }

    async fn upload(&mut self, paths: &[PathBuf]) {
        match self.engine.upload(paths).await {
            Ok(outcomes) => {
                for outcome in outcomes {
                    match outcome.status {
                        AttachmentStatus::Error => {
                            let detail = outcome.error.unwrap_or_else(|| "error desconocido".to_string());
                            println!("{} {}: {}", "✗".red(), outcome.name, detail);
                        }
                        _ => {
                            println!("{} {}", "✓".green(), outcome.name);
                            if let Some(reply) = outcome.reply {
                                println!("\n{}\n", reply);
                            }
                        }
                    }
                }
            }
            Err(e) => println!("{} {}", "Error:".red(), e),
        }
    }

    fn print_attachments(&self) {
        let attachments = self.engine.state.attachments();
        if attachments.is_empty() {
            println!("{}", "No hay archivos subidos.".dimmed());
            return;
        }

        println!();
        for attachment in attachments {
            let status = match attachment.status {
                AttachmentStatus::Ready => "listo".green(),
                AttachmentStatus::Processing => "procesando".yellow(),
                AttachmentStatus::Error => "error".red(),
            };
            println!("  {} [{}] ({})", attachment.name, status, attachment.id.dimmed());
        }
        println!();
    }

    /// Remove an attachment by name, falling back to its id
    fn remove_attachment(&mut self, target: &str) {
        let id = self
            .engine
            .state
            .attachments()
            .iter()
            .find(|a| a.name == target || a.id == target)
            .map(|a| a.id.clone());

        match id {
            Some(id) if self.engine.state.remove_attachment(&id) => {
                println!("{} {} quitado", "✓".green(), target);
            }
            _ => println!("{} No se encontró el archivo: {}", "?".yellow(), target),
        }
    }

    async fn summary(&mut self) {
        match self.engine.generate_summary().await {
            Ok(Some(summary)) => println!("\n{}\n", summary),
            Ok(None) => println!("{}", "Aún no hay suficiente conversación para un resumen.".dimmed()),
            Err(e) => println!("{} {}", "Error:".red(), e),
        }
    }

    fn export(&self, format: Option<&str>) {
        let format = match format {
            Some("json") => ExportFormat::Json,
            Some("md") | Some("markdown") => ExportFormat::Markdown,
            _ => {
                println!("Uso: {} <json|md>", "/exportar".yellow());
                return;
            }
        };

        match self.engine.export(format) {
            Ok(path) => println!("{} Exportado a {}", "✓".green(), path.display()),
            Err(e) => println!("{} {}", "Error:".red(), e),
        }
    }

    fn print_status(&self) {
        let status = self.engine.state.status();
        println!();
        println!("{} {}%", "Completitud:".bright_cyan(), self.engine.state.percentage());
        for (category, covered) in status.entries() {
            let mark = if covered { "✓".green() } else { "✗".red() };
            println!("  {} {}", mark, category);
        }
        println!();
    }

    fn print_history(&self) {
        let messages = self.engine.state.messages();
        if messages.is_empty() {
            println!("{}", "No hay conversación todavía.".dimmed());
            return;
        }

        println!();
        for (i, message) in messages.iter().enumerate() {
            let role = match message.role {
                Role::User => "Usuario".bright_green(),
                Role::Assistant => "Asistente".bright_blue(),
            };
            let preview: String = message.content.chars().take(60).collect();
            let suffix = if message.content.chars().count() > 60 { "..." } else { "" };
            println!("  {}. {}: {}{}", i + 1, role, preview, suffix);
        }
        println!();
    }
}

/// Result of handling a slash command
enum SlashResult {
    Continue,
    Quit,
}
