use serde::Serialize;

/// Structured trace events emitted across the LeafLyzer crates.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event")]
pub enum TraceEvent {
    DiagnosisCreated {
        diagnosis_id: String,
        user_id: String,
        disease: String,
        confidence: f64,
    },
    TranscriptAppend {
        diagnosis_id: String,
        sender: String,
    },
    DialogueAssembled {
        diagnosis_id: String,
        transcript_turns: usize,
        total_turns: usize,
    },
    GenerationCompleted {
        diagnosis_id: String,
        model: String,
        status: String,
        duration_ms: u64,
    },
    SafetyFallback {
        diagnosis_id: String,
        user_id: String,
    },
}

impl TraceEvent {
    pub fn emit(&self) {
        let json = serde_json::to_string(self).unwrap_or_default();
        tracing::info!(trace_event = %json, "ll_event");
    }
}
