//! Intake sequencer
//!
//! Walks a fixed ordered list of elicitation questions one at a time,
//! accumulating the user's raw answers. The sequencer itself never talks to
//! the model; the engine drives its transitions.

use tracing::debug;

/// One fixed elicitation question
#[derive(Debug, Clone, Copy)]
pub struct Question {
    pub id: &'static str,
    pub prompt: &'static str,
    pub category: &'static str,
}

/// The fixed intake question list, asked strictly in order
pub const QUESTIONS: [Question; 9] = [
    Question {
        id: "tipo_proyecto",
        prompt: "¿Qué tipo de proyecto o tarea necesitas definir? (Por ejemplo: desarrollo de software, construcción, evento, investigación, etc.)",
        category: "objetivos",
    },
    Question {
        id: "objetivo_principal",
        prompt: "¿Cuál es el objetivo principal que quieres lograr con este proyecto?",
        category: "objetivos",
    },
    Question {
        id: "alcance",
        prompt: "¿Puedes describir el alcance del proyecto? ¿Qué está incluido y qué está fuera del alcance?",
        category: "objetivos",
    },
    Question {
        id: "stakeholders",
        prompt: "¿Quiénes son los principales stakeholders o personas involucradas en este proyecto? (clientes, usuarios finales, equipo, patrocinadores, etc.)",
        category: "stakeholders",
    },
    Question {
        id: "plazo",
        prompt: "¿Cuál es el plazo o fecha límite para completar este proyecto? ¿Hay fechas importantes o hitos intermedios?",
        category: "plazos",
    },
    Question {
        id: "recursos",
        prompt: "¿Qué recursos necesitarás para este proyecto? (equipo humano, herramientas, tecnología, presupuesto, materiales, etc.)",
        category: "recursos",
    },
    Question {
        id: "restricciones",
        prompt: "¿Existen restricciones o limitaciones que debamos considerar? (presupuesto, tiempo, tecnología, regulaciones, etc.)",
        category: "restricciones",
    },
    Question {
        id: "criterios_exito",
        prompt: "¿Cómo definirías el éxito de este proyecto? ¿Cuáles son los criterios de aceptación o validación?",
        category: "criterios",
    },
    Question {
        id: "dependencias",
        prompt: "¿Este proyecto depende de otros proyectos, tareas o recursos externos? ¿Hay dependencias críticas?",
        category: "dependencias",
    },
];

/// Where the sequencer is in the scripted flow
///
/// `Summarizing` is held only for the duration of the closing model call; on
/// success the session becomes `FreeForm` for good, on failure it reverts to
/// asking the last question so the user can retry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntakePhase {
    /// Asking the fixed question at this index
    Asking(usize),
    /// Closing summary request is in flight
    Summarizing,
    /// Scripted flow exhausted; input is forwarded verbatim
    FreeForm,
}

/// A recorded answer to one fixed question
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Answer {
    pub question_id: &'static str,
    pub text: String,
}

/// Sequencer state: current phase plus the accumulated answer record
#[derive(Debug)]
pub struct Intake {
    phase: IntakePhase,
    answers: Vec<Answer>,
}

impl Default for Intake {
    fn default() -> Self {
        Self::new()
    }
}

impl Intake {
    /// Start at the first question
    pub fn new() -> Self {
        Self {
            phase: IntakePhase::Asking(0),
            answers: Vec::new(),
        }
    }

    pub fn phase(&self) -> IntakePhase {
        self.phase
    }

    /// The question currently being asked, if any
    pub fn current_question(&self) -> Option<&'static Question> {
        match self.phase {
            IntakePhase::Asking(index) => QUESTIONS.get(index),
            _ => None,
        }
    }

    /// True when the current question is the last one in the list
    pub fn on_last_question(&self) -> bool {
        matches!(self.phase, IntakePhase::Asking(index) if index == QUESTIONS.len() - 1)
    }

    /// Record the raw answer to the current question
    ///
    /// A retry after a failed model call overwrites the previous answer for
    /// the same question instead of appending a duplicate.
    pub fn record_answer(&mut self, text: &str) {
        let Some(question) = self.current_question() else {
            debug!("record_answer: no current question, ignoring");
            return;
        };
        let text = text.trim().to_string();
        if let Some(existing) = self.answers.iter_mut().find(|a| a.question_id == question.id) {
            debug!(question_id = question.id, "record_answer: overwriting previous answer");
            existing.text = text;
        } else {
            debug!(question_id = question.id, "record_answer: recorded");
            self.answers.push(Answer {
                question_id: question.id,
                text,
            });
        }
    }

    /// Move to the next question after a successful intermediate exchange
    pub fn advance(&mut self) {
        if let IntakePhase::Asking(index) = self.phase
            && index + 1 < QUESTIONS.len()
        {
            self.phase = IntakePhase::Asking(index + 1);
        }
    }

    /// Enter the closing-summary phase (only from the last question)
    pub fn begin_summary(&mut self) {
        if self.on_last_question() {
            self.phase = IntakePhase::Summarizing;
        }
    }

    /// Closing summary delivered; the sequencer is done for this session
    pub fn finish(&mut self) {
        self.phase = IntakePhase::FreeForm;
    }

    /// Closing summary failed; go back to asking the last question
    pub fn abort_summary(&mut self) {
        if self.phase == IntakePhase::Summarizing {
            self.phase = IntakePhase::Asking(QUESTIONS.len() - 1);
        }
    }

    /// All recorded answers in question order
    pub fn answers(&self) -> &[Answer] {
        &self.answers
    }

    /// Build the "previous answers" context block for prompts
    pub fn context_block(&self) -> String {
        self.answers
            .iter()
            .map(|answer| {
                let prompt = QUESTIONS
                    .iter()
                    .find(|q| q.id == answer.question_id)
                    .map(|q| q.prompt)
                    .unwrap_or("");
                format!("Pregunta: {}\nRespuesta: {}", prompt, answer.text)
            })
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    /// (current question number, total) while asking, for progress display
    pub fn progress(&self) -> Option<(usize, usize)> {
        match self.phase {
            IntakePhase::Asking(index) => Some((index + 1, QUESTIONS.len())),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_starts_at_first_question() {
        let intake = Intake::new();
        assert_eq!(intake.phase(), IntakePhase::Asking(0));
        assert_eq!(intake.current_question().unwrap().id, "tipo_proyecto");
        assert_eq!(intake.progress(), Some((1, 9)));
    }

    #[test]
    fn test_answers_follow_question_order() {
        let mut intake = Intake::new();
        for n in 0..QUESTIONS.len() - 1 {
            intake.record_answer(&format!("respuesta {}", n));
            intake.advance();
        }

        let answers = intake.answers();
        assert_eq!(answers.len(), QUESTIONS.len() - 1);
        for (answer, question) in answers.iter().zip(QUESTIONS.iter()) {
            assert_eq!(answer.question_id, question.id);
        }
        assert!(intake.on_last_question());
    }

    #[test]
    fn test_retry_overwrites_instead_of_duplicating() {
        let mut intake = Intake::new();
        intake.record_answer("primer intento");
        // Model call failed, user answers again without advancing
        intake.record_answer("segundo intento");

        assert_eq!(intake.answers().len(), 1);
        assert_eq!(intake.answers()[0].text, "segundo intento");
    }

    #[test]
    fn test_advance_never_skips_past_last() {
        let mut intake = Intake::new();
        for _ in 0..QUESTIONS.len() * 2 {
            intake.advance();
        }
        assert_eq!(intake.phase(), IntakePhase::Asking(QUESTIONS.len() - 1));
    }

    #[test]
    fn test_summary_transitions() {
        let mut intake = Intake::new();
        // begin_summary is a no-op unless on the last question
        intake.begin_summary();
        assert_eq!(intake.phase(), IntakePhase::Asking(0));

        while !intake.on_last_question() {
            intake.advance();
        }
        intake.begin_summary();
        assert_eq!(intake.phase(), IntakePhase::Summarizing);

        intake.abort_summary();
        assert!(intake.on_last_question());

        intake.begin_summary();
        intake.finish();
        assert_eq!(intake.phase(), IntakePhase::FreeForm);
        assert!(intake.current_question().is_none());
        assert!(intake.progress().is_none());
    }

    #[test]
    fn test_context_block_pairs_questions_with_answers() {
        let mut intake = Intake::new();
        intake.record_answer("un sistema de turnos");
        intake.advance();
        intake.record_answer("reducir la espera");

        let block = intake.context_block();
        assert!(block.contains(QUESTIONS[0].prompt));
        assert!(block.contains("Respuesta: un sistema de turnos"));
        assert!(block.contains(QUESTIONS[1].prompt));
        assert!(block.contains("Respuesta: reducir la espera"));
    }

    #[test]
    fn test_record_answer_trims_input() {
        let mut intake = Intake::new();
        intake.record_answer("  con espacios  ");
        assert_eq!(intake.answers()[0].text, "con espacios");
    }
}
