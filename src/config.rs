/// Last pipeline stage a run goes through.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
pub enum Stage {
    Scan,
    Parse,
    Analyze,
    #[default]
    Code,
}

/// Switches for the human-readable listing written alongside compilation,
/// plus how far the pipeline runs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TraceOptions {
    pub echo_source: bool,
    pub trace_scan: bool,
    pub trace_parse: bool,
    pub trace_analyze: bool,
    pub trace_code: bool,
    pub stop_after: Stage,
}

impl TraceOptions {
    pub fn all() -> TraceOptions {
        TraceOptions {
            echo_source: true,
            trace_scan: true,
            trace_parse: true,
            trace_analyze: true,
            trace_code: true,
            stop_after: Stage::Code,
        }
    }

    pub fn stop_after(self, stage: Stage) -> TraceOptions {
        TraceOptions {
            stop_after: stage,
            ..self
        }
    }
}
