use placebo_ir::MethodRef;
use placebo_model::Program;
use rayon::prelude::*;
use serde::Serialize;

use crate::error::Result;
use crate::scan::OriginalBodyFacts;
use crate::synthesizer::Synthesizer;

/// Outcome of synthesizing every library method of a program.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SynthesisReport {
    pub synthesized: usize,
    pub skipped: Vec<SkippedMethod>,
    pub methods_reading_arrays: usize,
    pub methods_writing_arrays: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedMethod {
    pub method: String,
    pub error: String,
}

impl SynthesisReport {
    pub fn is_clean(&self) -> bool {
        self.skipped.is_empty()
    }

    fn record(&mut self, method: &MethodRef, outcome: Result<OriginalBodyFacts>) {
        match outcome {
            Ok(facts) => {
                self.synthesized += 1;
                self.methods_reading_arrays += usize::from(facts.reads_array);
                self.methods_writing_arrays += usize::from(facts.writes_array);
            }
            Err(err) => {
                tracing::warn!(
                    target: "placebo.synth",
                    method = %method,
                    error = %err,
                    "skipping method"
                );
                self.skipped.push(SkippedMethod {
                    method: method.to_string(),
                    error: err.to_string(),
                });
            }
        }
    }
}

/// Replace the body of every library method of `program` with a placeholder.
///
/// Methods are synthesized in parallel against the unmodified program, then
/// installed in model order. A method that fails keeps its original body and
/// is listed in the report.
pub fn synthesize_program(program: &mut Program, synthesizer: &Synthesizer<'_>) -> SynthesisReport {
    let methods = program.library_methods();
    let results = {
        let program: &Program = program;
        let workers = Workers::new(synthesizer.options().threads);
        workers.map(&methods, |method| synthesizer.synthesize(program, method))
    };

    let mut report = SynthesisReport::default();
    for (method, result) in methods.iter().zip(results) {
        let outcome = result.and_then(|synthesized| {
            program.replace_body(method, synthesized.body)?;
            Ok(synthesized.facts)
        });
        report.record(method, outcome);
    }

    tracing::info!(
        target: "placebo.synth",
        abstraction = synthesizer.abstraction().name(),
        synthesized = report.synthesized,
        skipped = report.skipped.len(),
        methods_reading_arrays = report.methods_reading_arrays,
        methods_writing_arrays = report.methods_writing_arrays,
        "library synthesis finished"
    );
    report
}

enum Workers {
    Pool(rayon::ThreadPool),
    Inline,
}

impl Workers {
    fn new(threads: Option<usize>) -> Self {
        let mut threads = threads
            .unwrap_or_else(|| {
                std::thread::available_parallelism()
                    .map(|n| n.get())
                    .unwrap_or(1)
            })
            .max(1);
        loop {
            match rayon::ThreadPoolBuilder::new()
                .num_threads(threads)
                .thread_name(|idx| format!("placebo-synth-{idx}"))
                .build()
            {
                Ok(pool) => return Workers::Pool(pool),
                // Thread limits: retry with a smaller pool.
                Err(_) if threads > 1 => threads = (threads / 2).max(1),
                Err(err) => {
                    tracing::warn!(
                        target: "placebo.synth",
                        error = %err,
                        "no worker threads available; synthesizing inline"
                    );
                    return Workers::Inline;
                }
            }
        }
    }

    /// Results come back in input order.
    fn map<T, R, F>(&self, items: &[T], f: F) -> Vec<R>
    where
        T: Sync,
        R: Send,
        F: Fn(&T) -> R + Sync + Send,
    {
        match self {
            Workers::Pool(pool) => pool.install(|| items.par_iter().map(&f).collect()),
            Workers::Inline => items.iter().map(f).collect(),
        }
    }
}
