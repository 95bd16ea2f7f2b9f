use serde::{Deserialize, Serialize};

use crate::error::{PipelineError, Result};

/// The two pipeline shapes: free-form chat and schema-constrained analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskKind {
    Chat,
    Analysis,
}

/// Supported response languages.
///
/// Anything outside this set is rejected at parse time with
/// `UnsupportedLanguage`; there is no implicit default. Callers that want a
/// default must choose one explicitly before calling `parse`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    En,
    Fr,
}

impl Language {
    pub fn parse(tag: &str) -> Result<Self> {
        match tag {
            "en" => Ok(Language::En),
            "fr" => Ok(Language::Fr),
            other => Err(PipelineError::UnsupportedLanguage(other.to_string())),
        }
    }

    pub fn tag(&self) -> &'static str {
        match self {
            Language::En => "en",
            Language::Fr => "fr",
        }
    }
}

/// Fully rendered input for one model invocation. Ephemeral; scoped to a
/// single pipeline run.
#[derive(Debug, Clone)]
pub struct ModelRequest {
    pub system_instruction: String,
    pub user_message: String,
}

/// Machine-readable schema instructions appended to the analysis template.
/// The parser does no prose-stripping, so the instructions insist on a bare
/// JSON payload with nothing around it.
const SCHEMA_INSTRUCTIONS: &str = r#"The output must be a single JSON object with exactly these four fields and no others:
{"summary": "<string: brief overview of the medical record>", "key_findings": ["<string: important finding>", ...], "recommendations": ["<string: health recommendation>", ...], "next_steps": ["<string: suggested next step>", ...]}
Every field is required. The three list fields may be empty but must be present.
Respond with the raw JSON object ONLY: no markdown code fences, no commentary, no text before or after it."#;

const CHAT_SYSTEM_EN: &str = "You are MediCare AI, a medical AI assistant for Cameroon.

Your responsibilities:
- Provide accurate, evidence-based medical information
- Explain medical concepts in simple terms
- Always recommend consulting qualified healthcare professionals
- Be culturally sensitive to the Cameroonian context

IMPORTANT: You are NOT a doctor. Never provide definitive diagnoses.";

const CHAT_SYSTEM_FR: &str = "Vous êtes MediCare AI, un assistant médical IA pour le Cameroun.

Vos responsabilités:
- Fournir des informations médicales précises et basées sur des preuves
- Expliquer les concepts médicaux en termes simples
- Toujours recommander de consulter un professionnel de santé qualifié
- Être culturellement sensible au contexte camerounais

IMPORTANT: Vous n'êtes PAS un médecin. Ne donnez jamais de diagnostic définitif.";

const CHAT_USER_TEMPLATE: &str = "{user_question}";

const ANALYSIS_SYSTEM_EN: &str = "You are a medical AI assistant analyzing medical records.
Provide clear, accurate, and actionable insights.
Stay objective and always recommend professional medical consultation.";

const ANALYSIS_SYSTEM_FR: &str = "Vous êtes un assistant médical IA analysant des dossiers médicaux.
Fournissez des informations claires, précises et actionnables.
Restez objectif et recommandez toujours une consultation médicale professionnelle.";

const ANALYSIS_USER_TEMPLATE_EN: &str = "Analyze this medical record and provide a structured analysis:

Medical Record:
{medical_text}

Additional Context:
{context}

{format_instructions}

Respond ONLY with valid JSON.";

const ANALYSIS_USER_TEMPLATE_FR: &str = "Analysez ce dossier médical et fournissez une analyse structurée:

Dossier Médical:
{medical_text}

Contexte Additionnel:
{context}

{format_instructions}

Répondez UNIQUEMENT en JSON valide.";

/// Slot names that may appear in a user template. `render` asserts that
/// none of them survive substitution.
const SLOT_NAMES: [&str; 4] = [
    "user_question",
    "medical_text",
    "context",
    "format_instructions",
];

/// A language- and task-specific instruction template, selected purely by
/// `(task_kind, language)` from a static table. Immutable once built.
#[derive(Debug, Clone)]
pub struct PromptSpec {
    pub task_kind: TaskKind,
    pub language: Language,
    pub system_instruction: String,
    pub user_template: String,
    pub schema_instructions: Option<String>,
}

impl PromptSpec {
    /// Build the prompt template for one `(task_kind, language)` pair.
    ///
    /// For `Analysis`, the schema instructions are substituted into the
    /// template here, so the returned `user_template` only has the runtime
    /// slots (`{medical_text}`, `{context}`) left to fill.
    pub fn build(task_kind: TaskKind, language: Language) -> PromptSpec {
        let (system_instruction, user_template, schema_instructions) = match (task_kind, language) {
            (TaskKind::Chat, Language::En) => (CHAT_SYSTEM_EN, CHAT_USER_TEMPLATE.to_string(), None),
            (TaskKind::Chat, Language::Fr) => (CHAT_SYSTEM_FR, CHAT_USER_TEMPLATE.to_string(), None),
            (TaskKind::Analysis, Language::En) => (
                ANALYSIS_SYSTEM_EN,
                ANALYSIS_USER_TEMPLATE_EN.replace("{format_instructions}", SCHEMA_INSTRUCTIONS),
                Some(SCHEMA_INSTRUCTIONS.to_string()),
            ),
            (TaskKind::Analysis, Language::Fr) => (
                ANALYSIS_SYSTEM_FR,
                ANALYSIS_USER_TEMPLATE_FR.replace("{format_instructions}", SCHEMA_INSTRUCTIONS),
                Some(SCHEMA_INSTRUCTIONS.to_string()),
            ),
        };

        PromptSpec {
            task_kind,
            language,
            system_instruction: system_instruction.to_string(),
            user_template,
            schema_instructions,
        }
    }

    /// Substitute slot values into the user template and produce the request
    /// to dispatch. Substitution is a single pass over the template: only
    /// markers present in the template itself are replaced, and inserted
    /// values are never rescanned, so brace markers inside untrusted input
    /// pass through verbatim. A template slot missing from the fill list is
    /// a programming error (the template table and the orchestrator's slot
    /// list are both static), not a runtime fallback case.
    pub fn render(&self, slots: &[(&str, &str)]) -> ModelRequest {
        let mut user_message = String::with_capacity(self.user_template.len());
        let mut rest = self.user_template.as_str();

        'template: while let Some(pos) = rest.find('{') {
            user_message.push_str(&rest[..pos]);
            let tail = &rest[pos..];

            for (name, value) in slots {
                let marker = format!("{{{name}}}");
                if tail.starts_with(marker.as_str()) {
                    user_message.push_str(value);
                    rest = &tail[marker.len()..];
                    continue 'template;
                }
            }

            debug_assert!(
                !SLOT_NAMES
                    .iter()
                    .any(|name| tail.starts_with(&format!("{{{name}}}"))),
                "unfilled slot in prompt template"
            );

            // Not a slot marker; keep the brace literally.
            user_message.push('{');
            rest = &tail[1..];
        }
        user_message.push_str(rest);

        ModelRequest {
            system_instruction: self.system_instruction.clone(),
            user_message,
        }
    }
}
