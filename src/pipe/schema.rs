use std::collections::HashMap;
use std::fmt;

use axum::http::Method;

use super::Step;

/// The `in` and `out` step sequences for one HTTP method.
#[derive(Default)]
pub struct Phases {
    pub inbound: Vec<Box<dyn Step>>,
    pub outbound: Vec<Box<dyn Step>>,
}

impl Phases {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn inbound(mut self, step: impl Step + 'static) -> Self {
        self.inbound.push(Box::new(step));
        self
    }

    pub fn outbound(mut self, step: impl Step + 'static) -> Self {
        self.outbound.push(Box::new(step));
        self
    }
}

impl fmt::Debug for Phases {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names = |steps: &[Box<dyn Step>]| -> Vec<String> {
            steps.iter().map(|s| s.name().to_string()).collect()
        };
        f.debug_struct("Phases")
            .field("inbound", &names(&self.inbound))
            .field("outbound", &names(&self.outbound))
            .finish()
    }
}

/// Steps to run, keyed by HTTP method.
#[derive(Debug, Default)]
pub struct PipeSchema {
    methods: HashMap<Method, Phases>,
}

impl PipeSchema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn method(mut self, method: Method, phases: Phases) -> Self {
        self.methods.insert(method, phases);
        self
    }

    /// `HEAD` is served by the `GET` steps unless it has its own entry.
    pub fn phases_for(&self, method: &Method) -> Option<&Phases> {
        self.methods.get(method).or_else(|| {
            if *method == Method::HEAD {
                self.methods.get(&Method::GET)
            } else {
                None
            }
        })
    }

    pub fn methods(&self) -> impl Iterator<Item = &Method> {
        self.methods.keys()
    }
}
