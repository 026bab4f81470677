/// Where a request is in the pipeline.
///
/// `Received → Extracting → PromptBuilding → Generating → Parsing`, ending in
/// `Succeeded` or `Failed`. There is no resumption: a failed request is
/// resubmitted from the start.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Received,
    Extracting,
    PromptBuilding,
    Generating,
    Parsing,
    Succeeded,
    Failed,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Received => "received",
            Self::Extracting => "extracting",
            Self::PromptBuilding => "prompt_building",
            Self::Generating => "generating",
            Self::Parsing => "parsing",
            Self::Succeeded => "succeeded",
            Self::Failed => "failed",
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
