//! Session state
//!
//! The collected file list, the append-only history of generation contexts
//! (most recent first), the single current selection and the refinement
//! override. Every mutation goes through a method here so the invariants stay
//! in one place:
//!
//! - history order never changes once an entry is added;
//! - exactly one context is current once any analysis completed;
//! - selecting a context, completing an analysis or changing the current
//!   analysis clears the refinement override;
//! - an analysis completion only lands if no newer analysis was started
//!   (ticket check), so a slow request cannot overwrite a faster later one.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::analysis::{AnalysisResult, GroundingLink};
use crate::error::Error;
use crate::media::MediaKind;
use crate::source::SourceFile;
use crate::style::{render, PromptStyle};

/// One complete unit of analysis, code, task and generated media.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationContext {
    pub id: Uuid,
    pub analysis: AnalysisResult,
    pub code: String,
    pub task: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generated_logo_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generated_audio_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generated_video_url: Option<String>,
}

impl GenerationContext {
    pub fn media(&self, kind: MediaKind) -> Option<&str> {
        match kind {
            MediaKind::Logo => self.generated_logo_url.as_deref(),
            MediaKind::Audio => self.generated_audio_url.as_deref(),
            MediaKind::Video => self.generated_video_url.as_deref(),
        }
    }

    fn media_slot(&mut self, kind: MediaKind) -> &mut Option<String> {
        match kind {
            MediaKind::Logo => &mut self.generated_logo_url,
            MediaKind::Audio => &mut self.generated_audio_url,
            MediaKind::Video => &mut self.generated_video_url,
        }
    }

    /// First eight characters of the id, enough to select it.
    pub fn short_id(&self) -> String {
        self.id.simple().to_string()[..8].to_string()
    }
}

/// Proof that an analysis was started; needed to complete it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisTicket(pub u64);

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    #[serde(default)]
    files: Vec<SourceFile>,
    #[serde(default)]
    history: Vec<GenerationContext>,
    #[serde(default)]
    current: Option<Uuid>,
    #[serde(default)]
    refinement: Option<String>,
    #[serde(default)]
    next_ticket: u64,
    #[serde(default)]
    latest_ticket: Option<u64>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    // =========================================================================
    // Files
    // =========================================================================

    pub fn files(&self) -> &[SourceFile] {
        &self.files
    }

    /// Replace the collected files wholesale. Callers only invoke this on success.
    pub fn replace_files(&mut self, files: Vec<SourceFile>) {
        self.files = files;
    }

    // =========================================================================
    // Analysis lifecycle
    // =========================================================================

    /// Start an analysis. Any analysis started earlier becomes stale.
    pub fn begin_analysis(&mut self) -> AnalysisTicket {
        self.next_ticket += 1;
        self.latest_ticket = Some(self.next_ticket);
        AnalysisTicket(self.next_ticket)
    }

    /// Record a finished analysis as a new current context.
    pub fn complete_analysis(
        &mut self,
        ticket: AnalysisTicket,
        analysis: AnalysisResult,
        code: String,
        task: String,
        timestamp: DateTime<Utc>,
    ) -> Result<&GenerationContext, Error> {
        match self.latest_ticket {
            Some(latest) if latest == ticket.0 => {}
            Some(latest) => {
                return Err(Error::StaleCompletion {
                    ticket: ticket.0,
                    latest,
                })
            }
            None => {
                return Err(Error::StaleCompletion {
                    ticket: ticket.0,
                    latest: self.next_ticket,
                })
            }
        }

        let context = GenerationContext {
            id: Uuid::new_v4(),
            analysis,
            code,
            task,
            timestamp,
            generated_logo_url: None,
            generated_audio_url: None,
            generated_video_url: None,
        };

        self.latest_ticket = None;
        self.current = Some(context.id);
        self.refinement = None;
        self.history.insert(0, context);
        Ok(&self.history[0])
    }

    // =========================================================================
    // History and selection
    // =========================================================================

    /// All contexts, most recent first.
    pub fn history(&self) -> &[GenerationContext] {
        &self.history
    }

    pub fn current(&self) -> Option<&GenerationContext> {
        let id = self.current?;
        self.history.iter().find(|c| c.id == id)
    }

    pub fn current_or_err(&self) -> Result<&GenerationContext, Error> {
        self.current().ok_or(Error::NoCurrentContext)
    }

    /// Find a context by 1-based history index, full id or id prefix.
    pub fn find(&self, key: &str) -> Result<&GenerationContext, Error> {
        let key = key.trim();
        if key.len() < 8 {
            if let Ok(index) = key.parse::<usize>() {
                return index
                    .checked_sub(1)
                    .and_then(|i| self.history.get(i))
                    .ok_or_else(|| Error::ContextNotFound(key.to_string()));
            }
        }

        let needle = key.replace('-', "").to_ascii_lowercase();
        if needle.is_empty() {
            return Err(Error::ContextNotFound(key.to_string()));
        }
        let mut matches = self
            .history
            .iter()
            .filter(|c| c.id.simple().to_string().starts_with(&needle));

        match (matches.next(), matches.next()) {
            (Some(context), None) => Ok(context),
            _ => Err(Error::ContextNotFound(key.to_string())),
        }
    }

    /// Make a history entry current. History order is untouched.
    pub fn select(&mut self, key: &str) -> Result<&GenerationContext, Error> {
        let id = self.find(key)?.id;
        self.current = Some(id);
        self.refinement = None;
        self.current_or_err()
    }

    fn context_mut(&mut self, id: Uuid) -> Option<&mut GenerationContext> {
        self.history.iter_mut().find(|c| c.id == id)
    }

    // =========================================================================
    // Mutations by identity
    // =========================================================================

    /// Attach grounding links to a context's analysis.
    pub fn attach_grounding(&mut self, id: Uuid, links: Vec<GroundingLink>) -> Result<(), Error> {
        let is_current = self.current == Some(id);
        let context = self
            .context_mut(id)
            .ok_or_else(|| Error::ContextNotFound(id.to_string()))?;
        context.analysis.grounding_links = Some(links);
        if is_current {
            self.refinement = None;
        }
        Ok(())
    }

    /// Fail if the media has already been generated for this context.
    pub fn ensure_media_unset(&self, id: Uuid, kind: MediaKind) -> Result<(), Error> {
        let context = self
            .history
            .iter()
            .find(|c| c.id == id)
            .ok_or_else(|| Error::ContextNotFound(id.to_string()))?;
        match context.media(kind) {
            Some(_) => Err(Error::MediaAlreadyGenerated(kind.to_string())),
            None => Ok(()),
        }
    }

    /// Store a generated media URL on the context it was generated for.
    pub fn attach_media(&mut self, id: Uuid, kind: MediaKind, url: String) -> Result<(), Error> {
        self.ensure_media_unset(id, kind)?;
        let context = self
            .context_mut(id)
            .ok_or_else(|| Error::ContextNotFound(id.to_string()))?;
        *context.media_slot(kind) = Some(url);
        Ok(())
    }

    // =========================================================================
    // Prompt display and refinement
    // =========================================================================

    pub fn refinement(&self) -> Option<&str> {
        self.refinement.as_deref()
    }

    pub fn set_refinement(&mut self, text: String) -> Result<(), Error> {
        self.current_or_err()?;
        self.refinement = Some(text);
        Ok(())
    }

    /// Drop the override. Returns whether there was one.
    pub fn revert_refinement(&mut self) -> bool {
        self.refinement.take().is_some()
    }

    /// The prompt to show: the refinement override if any, else the styled render.
    pub fn displayed_prompt(&self, style: PromptStyle) -> Result<String, Error> {
        let context = self.current_or_err()?;
        Ok(match &self.refinement {
            Some(text) => text.clone(),
            None => render(style, &context.analysis, &context.code, &context.task),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn analysis(objective: &str) -> AnalysisResult {
        AnalysisResult {
            role: "Engineer".to_string(),
            language_framework: "Rust".to_string(),
            main_objective: objective.to_string(),
            technical_purpose: "Does things.".to_string(),
            key_features: vec!["One".to_string()],
            structure_classes: vec![],
            structure_functions: vec![],
            dependencies: vec!["serde".to_string()],
            grounding_links: None,
        }
    }

    fn analyzed(session: &mut Session, objective: &str, code: &str, task: &str) -> Uuid {
        let ticket = session.begin_analysis();
        session
            .complete_analysis(
                ticket,
                analysis(objective),
                code.to_string(),
                task.to_string(),
                Utc::now(),
            )
            .unwrap()
            .id
    }

    #[test]
    fn test_replace_files() {
        let mut session = Session::new();
        session.replace_files(vec![SourceFile::new("a", "1")]);
        session.replace_files(vec![SourceFile::new("b", "2")]);
        assert_eq!(session.files(), &[SourceFile::new("b", "2")]);
    }

    #[test]
    fn test_history_most_recent_first() {
        let mut session = Session::new();
        let first = analyzed(&mut session, "first", "c1", "");
        let second = analyzed(&mut session, "second", "c2", "");

        let ids: Vec<Uuid> = session.history().iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![second, first]);
        assert_eq!(session.current().unwrap().id, second);
    }

    #[test]
    fn test_stale_completion_discarded() {
        let mut session = Session::new();
        let slow = session.begin_analysis();
        let fast = session.begin_analysis();

        session
            .complete_analysis(fast, analysis("fast"), String::new(), String::new(), Utc::now())
            .unwrap();
        let err = session
            .complete_analysis(slow, analysis("slow"), String::new(), String::new(), Utc::now())
            .unwrap_err();

        assert_eq!(err, Error::StaleCompletion { ticket: 1, latest: 2 });
        assert_eq!(session.history().len(), 1);
        assert_eq!(session.current().unwrap().analysis.main_objective, "fast");
    }

    #[test]
    fn test_stale_completion_while_newer_pending() {
        let mut session = Session::new();
        let old = session.begin_analysis();
        let _new = session.begin_analysis();
        assert_eq!(
            session
                .complete_analysis(old, analysis("old"), String::new(), String::new(), Utc::now())
                .unwrap_err(),
            Error::StaleCompletion { ticket: 1, latest: 2 }
        );
        assert!(session.current().is_none());
    }

    #[test]
    fn test_select_restores_context_and_clears_refinement() {
        let mut session = Session::new();
        let first = analyzed(&mut session, "first", "code one", "task one");
        let _second = analyzed(&mut session, "second", "code two", "task two");
        session.set_refinement("refined".to_string()).unwrap();

        let order_before: Vec<Uuid> = session.history().iter().map(|c| c.id).collect();
        let selected = session.select("2").unwrap().clone();

        assert_eq!(selected.id, first);
        assert_eq!(selected.analysis, analysis("first"));
        assert_eq!(selected.code, "code one");
        assert_eq!(selected.task, "task one");
        assert!(session.refinement().is_none());
        let order_after: Vec<Uuid> = session.history().iter().map(|c| c.id).collect();
        assert_eq!(order_before, order_after);
        assert_eq!(
            session.displayed_prompt(PromptStyle::Concise).unwrap(),
            render(PromptStyle::Concise, &analysis("first"), "code one", "task one")
        );
    }

    #[test]
    fn test_select_by_id_prefix() {
        let mut session = Session::new();
        let id = analyzed(&mut session, "only", "", "");
        let prefix = id.simple().to_string()[..8].to_string();
        assert_eq!(session.select(&prefix).unwrap().id, id);
        assert_eq!(session.select(&id.to_string()).unwrap().id, id);
        assert!(matches!(
            session.select("zzzzzzzz"),
            Err(Error::ContextNotFound(_))
        ));
        assert!(matches!(session.select("9"), Err(Error::ContextNotFound(_))));
    }

    #[test]
    fn test_refinement_override_and_revert() {
        let mut session = Session::new();
        analyzed(&mut session, "obj", "code", "");
        let technical = session.displayed_prompt(PromptStyle::Technical).unwrap();

        session.set_refinement("my refined prompt".to_string()).unwrap();
        for style in PromptStyle::ALL {
            assert_eq!(session.displayed_prompt(style).unwrap(), "my refined prompt");
        }

        assert!(session.revert_refinement());
        assert!(!session.revert_refinement());
        assert_eq!(session.displayed_prompt(PromptStyle::Technical).unwrap(), technical);
    }

    #[test]
    fn test_new_analysis_clears_refinement() {
        let mut session = Session::new();
        analyzed(&mut session, "a", "", "");
        session.set_refinement("x".to_string()).unwrap();
        analyzed(&mut session, "b", "", "");
        assert!(session.refinement().is_none());
    }

    #[test]
    fn test_refinement_requires_context() {
        let mut session = Session::new();
        assert_eq!(
            session.set_refinement("x".to_string()),
            Err(Error::NoCurrentContext)
        );
        assert_eq!(
            session.displayed_prompt(PromptStyle::Technical),
            Err(Error::NoCurrentContext)
        );
    }

    #[test]
    fn test_grounding_attaches_and_clears_refinement() {
        let mut session = Session::new();
        let id = analyzed(&mut session, "a", "", "");
        session.set_refinement("x".to_string()).unwrap();

        let links = vec![GroundingLink {
            title: "serde".to_string(),
            url: "https://serde.rs".to_string(),
        }];
        session.attach_grounding(id, links.clone()).unwrap();

        assert_eq!(session.current().unwrap().analysis.links(), links.as_slice());
        assert!(session.refinement().is_none());
    }

    #[test]
    fn test_media_guard() {
        let mut session = Session::new();
        let id = analyzed(&mut session, "a", "", "");

        session.ensure_media_unset(id, MediaKind::Logo).unwrap();
        session
            .attach_media(id, MediaKind::Logo, "data:image/png;base64,AA==".to_string())
            .unwrap();
        assert_eq!(
            session.ensure_media_unset(id, MediaKind::Logo),
            Err(Error::MediaAlreadyGenerated("logo".to_string()))
        );
        assert!(session
            .attach_media(id, MediaKind::Logo, "other".to_string())
            .is_err());
        // Other media kinds are independent
        session.ensure_media_unset(id, MediaKind::Video).unwrap();
        assert_eq!(
            session.current().unwrap().media(MediaKind::Logo),
            Some("data:image/png;base64,AA==")
        );
    }

    #[test]
    fn test_media_lands_on_original_context_after_switch() {
        let mut session = Session::new();
        let first = analyzed(&mut session, "a", "", "");
        let second = analyzed(&mut session, "b", "", "");
        assert_eq!(session.current().unwrap().id, second);

        session
            .attach_media(first, MediaKind::Audio, "data:audio/wav;base64,".to_string())
            .unwrap();

        assert!(session.current().unwrap().generated_audio_url.is_none());
        assert!(session.find("2").unwrap().generated_audio_url.is_some());
    }

    #[test]
    fn test_session_serde_round_trip() {
        let mut session = Session::new();
        session.replace_files(vec![SourceFile::new("a.py", "print(1)")]);
        analyzed(&mut session, "a", "code", "task");
        session.set_refinement("r".to_string()).unwrap();
        let _pending = session.begin_analysis();

        let json = serde_json::to_string(&session).unwrap();
        let restored: Session = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, session);
    }
}
