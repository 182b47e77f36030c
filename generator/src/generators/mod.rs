pub(crate) mod common;
mod rust;

use tracing::{info, warn};
use wsdlgen_wsdl::ServiceDescription;
use wsdlgen_xsd::TypeGraph;

use self::common::GeneratorContext;
use crate::{binding::Planner, error::GenerationError, BindingPlan, Config};

/// Output of a generator run.
#[derive(Debug)]
pub struct Generated {
    /// Rust source of the client module
    pub source: String,
    /// The plans of the operations that made it into `source`
    pub plans: Vec<BindingPlan>,
    /// Operations left out, with the reason
    pub failures: Vec<GenerationError>,
}

/// Generates the client for every operation of `description`. An operation that cannot be
/// bound is reported in [`Generated::failures`] and does not stop the others.
pub fn generate(config: &Config, description: &ServiceDescription, graph: &TypeGraph) -> Generated {
    let mut context = GeneratorContext::new(graph, config.requested_namespace());

    let mut plans = vec![];
    let mut failures = vec![];
    let mut planner = Planner::new(&mut context, config);
    for (port, operation) in description.operations() {
        match planner.plan(description, port, operation) {
            Ok(plan) => plans.push(plan),
            Err(err) => {
                warn!(operation = %operation.name, "skipping operation: {err}");
                failures.push(err);
            }
        }
    }

    let source = rust::generate(config, description, &context, &plans);
    info!(
        types = context.emitted().count(),
        operations = plans.len(),
        failed = failures.len(),
        "generated client"
    );
    Generated {
        source,
        plans,
        failures,
    }
}
