use crate::process::ProcessContext;

/// Non-fatal conditions the solver keeps going through. These are warnings
/// by contract; none of them ever aborts a solve.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Diagnostic {
    /// The tail fit ran without an explicit window and fell back to the
    /// outer 20% of the frequency mesh.
    DefaultTailFitWindow,
    /// The bare propagator's tail metadata deviates from the canonical
    /// `1/(iw)` decay on the named blocks.
    BareTailDecay { blocks: Vec<String> },
}

impl Diagnostic {
    fn lines(&self) -> Vec<String> {
        match self {
            Diagnostic::DefaultTailFitWindow => vec![
                "WARNING: Using default high-frequency tail fitting window,".to_string(),
                "the fitted range and moments should be checked for sanity!".to_string(),
            ],
            Diagnostic::BareTailDecay { blocks } => vec![
                format!(
                    "WARNING: some blocks of G0_iw do not decay as 1/iw: {}.",
                    blocks.join(", ")
                ),
                "Continuing nonetheless.".to_string(),
            ],
        }
    }

    /// Fixed-width exclamation banner around the warning text.
    pub fn banner(&self) -> String {
        let lines = self.lines();
        let width = lines.iter().map(|line| line.len()).max().unwrap_or(0);
        let rule = format!("!{}!", "-".repeat(width + 2));

        let mut rendered = Vec::with_capacity(lines.len() + 2);
        rendered.push(rule.clone());
        for line in lines {
            rendered.push(format!("! {line:<width$} !"));
        }
        rendered.push(rule);
        rendered.join("\n")
    }
}

/// Collects diagnostics during a solve and prints them on the master rank
/// only; every rank records them regardless, so callers can inspect what
/// was raised after the fact.
#[derive(Debug)]
pub struct DiagnosticReporter {
    context: ProcessContext,
    emitted: Vec<Diagnostic>,
}

impl DiagnosticReporter {
    pub fn new(context: ProcessContext) -> Self {
        Self {
            context,
            emitted: Vec::new(),
        }
    }

    pub fn report(&mut self, diagnostic: Diagnostic) {
        if self.context.is_master() {
            println!("{}", diagnostic.banner());
        }
        self.emitted.push(diagnostic);
    }

    pub fn emitted(&self) -> &[Diagnostic] {
        &self.emitted
    }

    pub fn into_emitted(self) -> Vec<Diagnostic> {
        self.emitted
    }
}
