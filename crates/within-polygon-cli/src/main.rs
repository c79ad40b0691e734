mod settings;

use clap::Parser;
use settings::Settings;
use std::io::Write;
use std::process::ExitCode;
use within_polygon_lib::{
    Binding, Config, ExecutionContext, GeoStore, Node, PropFuncArg, PropertyFunctionRegistry,
    Result, register_spatial_functions, vocab,
};

/// Variable bound to matching subjects when no `--subject` is given
const SUBJECT_VARIABLE: &str = "s";

fn setup_logging() {
    use tracing_subscriber::prelude::*;

    // Logs go to stderr so stdout only carries results
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_filter(filter);

    tracing_subscriber::registry().with(fmt_layer).init();
}

fn main() -> ExitCode {
    let settings = Settings::parse();
    setup_logging();

    match run(&settings) {
        Ok(matches) => {
            tracing::info!("{matches} matching subject(s)");
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!("{e}");
            ExitCode::FAILURE
        }
    }
}

fn run(settings: &Settings) -> Result<usize> {
    #[cfg(feature = "profiling")]
    profiling::scope!("cli::run");

    let store = load_store(settings)?;
    let mut out = std::io::stdout().lock();
    let matches = write_matches(&mut out, &store, settings)?;
    out.flush()?;
    Ok(matches)
}

fn load_store(settings: &Settings) -> Result<GeoStore> {
    let config = Config {
        max_points_per_node: settings.max_points_per_node,
        max_depth: settings.max_depth,
        base_iri: settings.base_iri.clone(),
    };
    let mut store = GeoStore::new(config);
    if !settings.gpx_files.is_empty() {
        store.load_from_files(settings.gpx_files.clone())?;
    }
    let info = store.get_info();
    tracing::debug!(
        "Store holds {} subjects, {} indexed points",
        info.subject_count,
        info.indexed_points
    );
    Ok(store)
}

fn subject_node(settings: &Settings) -> Node {
    match &settings.subject {
        Some(iri) => Node::iri(iri.as_str()),
        None => Node::variable(SUBJECT_VARIABLE),
    }
}

/// Object argument `(polygon point_delimiter coordinate_delimiter long_lat ignore_errors)`
fn object_argument(settings: &Settings) -> PropFuncArg {
    PropFuncArg::List(vec![
        Node::literal(settings.polygon.as_str()),
        Node::literal(settings.point_delimiter.as_str()),
        Node::literal(settings.coordinate_delimiter.as_str()),
        Node::boolean(settings.long_lat),
        Node::boolean(settings.ignore_errors),
    ])
}

/// Run the query against `store` and write one `subject\tlat\tlon` line per match
fn write_matches<W: Write>(out: &mut W, store: &GeoStore, settings: &Settings) -> Result<usize> {
    let mut registry = PropertyFunctionRegistry::new();
    register_spatial_functions(&mut registry);
    let function = registry.create(vocab::WITHIN_POLYGON)?;

    let subject = subject_node(settings);
    let compiled = function.build(
        &PropFuncArg::Node(subject.clone()),
        &Node::iri(vocab::WITHIN_POLYGON),
        &object_argument(settings),
    )?;
    tracing::debug!("Compiled {compiled:?}");

    let cx = ExecutionContext::new(store, store);
    let mut matches = 0;
    for binding in compiled.execute(Binding::new(), cx) {
        let iri = match &subject {
            Node::Variable(name) => binding.get(name).and_then(Node::as_iri),
            bound => bound.as_iri(),
        };
        let Some(iri) = iri else {
            continue;
        };
        match store.point_of(iri) {
            Some((lat, lon)) => writeln!(out, "{iri}\t{lat}\t{lon}")?,
            None => writeln!(out, "{iri}")?,
        }
        matches += 1;
    }

    Ok(matches)
}
