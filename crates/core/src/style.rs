//! Prompt styles
//!
//! Each [`PromptStyle`] maps to a pure template function that lays out the
//! same [`AnalysisResult`] fields differently. Rendering borrows the analysis
//! immutably and always returns trimmed text.

use std::fmt::Write;

use crate::analysis::{AnalysisResult, GroundingLink};
use crate::error::Error;

/// Every available output style.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PromptStyle {
    #[default]
    Technical,
    Compact,
    Concise,
    Popular,
    Friendly,
    Descriptive,
    Blueprint,
    Noir,
}

impl PromptStyle {
    pub const ALL: [PromptStyle; 8] = [
        PromptStyle::Technical,
        PromptStyle::Compact,
        PromptStyle::Concise,
        PromptStyle::Popular,
        PromptStyle::Friendly,
        PromptStyle::Descriptive,
        PromptStyle::Blueprint,
        PromptStyle::Noir,
    ];

    pub fn name(self) -> &'static str {
        match self {
            PromptStyle::Technical => "technical",
            PromptStyle::Compact => "compact",
            PromptStyle::Concise => "concise",
            PromptStyle::Popular => "popular",
            PromptStyle::Friendly => "friendly",
            PromptStyle::Descriptive => "descriptive",
            PromptStyle::Blueprint => "blueprint",
            PromptStyle::Noir => "noir",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            PromptStyle::Technical => "Structured markdown brief with every analysis field",
            PromptStyle::Compact => "Dense, token-frugal summary",
            PromptStyle::Concise => "Stack, objective, features and code, nothing else",
            PromptStyle::Popular => "The classic \"I want you to act as\" prompt",
            PromptStyle::Friendly => "Conversational request to a helpful colleague",
            PromptStyle::Descriptive => "Full prose description of the project",
            PromptStyle::Blueprint => "Engineering blueprint with boxed sections",
            PromptStyle::Noir => "Hard-boiled detective case file",
        }
    }

    /// Heading that introduces the task section, absent when the task is empty.
    pub fn task_heading(self) -> &'static str {
        match self {
            PromptStyle::Technical => "## Task",
            PromptStyle::Compact => "TASK:",
            PromptStyle::Concise => "Task:",
            PromptStyle::Popular => "My request:",
            PromptStyle::Friendly => "Here's what I need help with:",
            PromptStyle::Descriptive => "## What Needs To Be Done",
            PromptStyle::Blueprint => "[ WORK ORDER ]",
            PromptStyle::Noir => "THE JOB:",
        }
    }

    /// Whether the template appends grounding references.
    pub fn supports_references(self) -> bool {
        matches!(
            self,
            PromptStyle::Technical
                | PromptStyle::Descriptive
                | PromptStyle::Blueprint
                | PromptStyle::Noir
        )
    }
}

impl std::fmt::Display for PromptStyle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl std::str::FromStr for PromptStyle {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        PromptStyle::ALL
            .into_iter()
            .find(|style| style.name() == wanted)
            .ok_or_else(|| Error::InvalidStyle(s.to_string()))
    }
}

/// Render the prompt for `style`.
pub fn render(style: PromptStyle, analysis: &AnalysisResult, code: &str, task: &str) -> String {
    let task = task.trim();
    let text = match style {
        PromptStyle::Technical => technical(analysis, code, task),
        PromptStyle::Compact => compact(analysis, code, task),
        PromptStyle::Concise => concise(analysis, code, task),
        PromptStyle::Popular => popular(analysis, code, task),
        PromptStyle::Friendly => friendly(analysis, code, task),
        PromptStyle::Descriptive => descriptive(analysis, code, task),
        PromptStyle::Blueprint => blueprint(analysis, code, task),
        PromptStyle::Noir => noir(analysis, code, task),
    };
    text.trim().to_string()
}

// =============================================================================
// Shared pieces
// =============================================================================

/// Wrap code in a backtick fence longer than any backtick run inside it.
pub fn fenced(code: &str) -> String {
    let longest_run = code
        .split(|c| c != '`')
        .map(str::len)
        .max()
        .unwrap_or(0);
    let fence = "`".repeat(longest_run.max(2) + 1);
    format!("{fence}\n{}\n{fence}", code.trim_end())
}

fn bullets(items: &[String]) -> String {
    if items.is_empty() {
        return "- (none identified)".to_string();
    }
    items
        .iter()
        .map(|item| format!("- {item}"))
        .collect::<Vec<_>>()
        .join("\n")
}

fn inline_list(items: &[String]) -> String {
    if items.is_empty() {
        "none".to_string()
    } else {
        items.join(", ")
    }
}

fn references(links: &[GroundingLink], heading: &str) -> String {
    if links.is_empty() {
        return String::new();
    }
    let mut out = format!("\n\n{heading}\n");
    for link in links {
        let _ = writeln!(out, "- [{}]({})", link.title, link.url);
    }
    out
}

fn task_section(style: PromptStyle, task: &str, separator: &str) -> String {
    if task.is_empty() {
        String::new()
    } else {
        format!("{}{separator}{task}\n\n", style.task_heading())
    }
}

// =============================================================================
// Templates
// =============================================================================

fn technical(a: &AnalysisResult, code: &str, task: &str) -> String {
    format!(
        "# Role\nYou are a {role}.\n\n\
         ## Project Context\n\
         - **Language / Framework:** {lf}\n\
         - **Main Objective:** {objective}\n\
         - **Technical Purpose:** {purpose}\n\n\
         ## Key Features\n{features}\n\n\
         ## Code Structure\n\
         ### Classes / Types\n{classes}\n\n\
         ### Functions\n{functions}\n\n\
         ## Dependencies\n{deps}\n\n\
         {task}\
         ## Source Code\n{code}{refs}",
        role = a.role,
        lf = a.language_framework,
        objective = a.main_objective,
        purpose = a.technical_purpose,
        features = bullets(&a.key_features),
        classes = bullets(&a.structure_classes),
        functions = bullets(&a.structure_functions),
        deps = bullets(&a.dependencies),
        task = task_section(PromptStyle::Technical, task, "\n"),
        code = fenced(code),
        refs = references(a.links(), "## References"),
    )
}

fn compact(a: &AnalysisResult, code: &str, task: &str) -> String {
    format!(
        "ROLE: {role} | STACK: {lf}\n\
         GOAL: {objective}\n\
         HOW: {purpose}\n\
         {features}\
         TYPES: {classes} | FNS: {functions}\n\
         DEPS: {deps}\n\n\
         {task}\
         CODE:\n{code}",
        role = a.role,
        lf = a.language_framework,
        objective = a.main_objective,
        purpose = a.technical_purpose,
        features = compact_features(&a.key_features),
        classes = inline_list(&a.structure_classes),
        functions = inline_list(&a.structure_functions),
        deps = inline_list(&a.dependencies),
        task = task_section(PromptStyle::Compact, task, " "),
        code = fenced(code),
    )
}

fn compact_features(features: &[String]) -> String {
    if features.is_empty() {
        String::new()
    } else {
        format!("FEATURES: {}\n", features.join("; "))
    }
}

fn concise(a: &AnalysisResult, code: &str, task: &str) -> String {
    format!(
        "Language/Framework: {lf}\n\
         Objective: {objective}\n\
         Features:\n{features}\n\n\
         {task}\
         {code}",
        lf = a.language_framework,
        objective = a.main_objective,
        features = bullets(&a.key_features),
        task = task_section(PromptStyle::Concise, task, " "),
        code = fenced(code),
    )
}

fn popular(a: &AnalysisResult, code: &str, task: &str) -> String {
    format!(
        "I want you to act as a {role}. I will give you the source code of a {lf} project \
         and you will help me work on it. The project's goal: {objective} \
         Under the hood: {purpose}\n\n\
         The most important features are:\n{features}\n\n\
         It relies on: {deps}.\n\n\
         {task}\
         Here is the code:\n{code}",
        role = a.role,
        lf = a.language_framework,
        objective = a.main_objective,
        purpose = a.technical_purpose,
        features = bullets(&a.key_features),
        deps = inline_list(&a.dependencies),
        task = task_section(PromptStyle::Popular, task, " "),
        code = fenced(code),
    )
}

fn friendly(a: &AnalysisResult, code: &str, task: &str) -> String {
    format!(
        "Hi! I'd love your help as a {role}.\n\n\
         I'm working on a {lf} project. In short: {objective}\n\n\
         A bit more detail: {purpose}\n\n\
         Things it already does:\n{features}\n\n\
         The main building blocks are {classes} and the functions {functions}.\n\n\
         {task}\
         Here's the code so you can take a look:\n{code}\n\n\
         Thanks a lot!",
        role = a.role,
        lf = a.language_framework,
        objective = a.main_objective,
        purpose = a.technical_purpose,
        features = bullets(&a.key_features),
        classes = inline_list(&a.structure_classes),
        functions = inline_list(&a.structure_functions),
        task = task_section(PromptStyle::Friendly, task, "\n"),
        code = fenced(code),
    )
}

fn descriptive(a: &AnalysisResult, code: &str, task: &str) -> String {
    format!(
        "# Project Description\n\n\
         You are a {role} joining an existing project written in {lf}.\n\n\
         ## Purpose\n{objective}\n\n\
         ## How It Works\n{purpose}\n\n\
         ## Capabilities\n{features}\n\n\
         ## Architecture\n\
         The code is organised around the following types:\n{classes}\n\n\
         The main functions are:\n{functions}\n\n\
         ## External Dependencies\n{deps}\n\n\
         {task}\
         ## Complete Source\n{code}{refs}",
        role = a.role,
        lf = a.language_framework,
        objective = a.main_objective,
        purpose = a.technical_purpose,
        features = bullets(&a.key_features),
        classes = bullets(&a.structure_classes),
        functions = bullets(&a.structure_functions),
        deps = bullets(&a.dependencies),
        task = task_section(PromptStyle::Descriptive, task, "\n"),
        code = fenced(code),
        refs = references(a.links(), "## Further Reading"),
    )
}

fn blueprint(a: &AnalysisResult, code: &str, task: &str) -> String {
    format!(
        "+--------------------------------------+\n\
         |          PROJECT BLUEPRINT           |\n\
         +--------------------------------------+\n\n\
         [ ENGINEER ]    {role}\n\
         [ MATERIALS ]   {lf}\n\
         [ OBJECTIVE ]   {objective}\n\
         [ MECHANISM ]   {purpose}\n\n\
         [ COMPONENTS ]\n{features}\n\n\
         [ STRUCTURAL MEMBERS ]\n{classes}\n\n\
         [ MOVING PARTS ]\n{functions}\n\n\
         [ SUPPLIERS ]\n{deps}\n\n\
         {task}\
         [ SCHEMATICS ]\n{code}{refs}",
        role = a.role,
        lf = a.language_framework,
        objective = a.main_objective,
        purpose = a.technical_purpose,
        features = bullets(&a.key_features),
        classes = bullets(&a.structure_classes),
        functions = bullets(&a.structure_functions),
        deps = bullets(&a.dependencies),
        task = task_section(PromptStyle::Blueprint, task, "\n"),
        code = fenced(code),
        refs = references(a.links(), "[ SPEC SHEETS ]"),
    )
}

fn noir(a: &AnalysisResult, code: &str, task: &str) -> String {
    format!(
        "CASE FILE\n\n\
         The rain hadn't stopped in three days when the code landed on my desk. \
         {lf}. It always is.\n\n\
         You're the {role} I call when things get ugly.\n\n\
         THE MOTIVE: {objective}\n\n\
         THE METHOD: {purpose}\n\n\
         WHAT WE KNOW:\n{features}\n\n\
         THE USUAL SUSPECTS: {classes}\n\
         THEIR ACCOMPLICES: {functions}\n\
         KNOWN ASSOCIATES: {deps}\n\n\
         {task}\
         THE EVIDENCE:\n{code}{refs}",
        role = a.role,
        lf = a.language_framework,
        objective = a.main_objective,
        purpose = a.technical_purpose,
        features = bullets(&a.key_features),
        classes = inline_list(&a.structure_classes),
        functions = inline_list(&a.structure_functions),
        deps = inline_list(&a.dependencies),
        task = task_section(PromptStyle::Noir, task, "\n"),
        code = fenced(code),
        refs = references(a.links(), "INFORMANTS:"),
    )
}
