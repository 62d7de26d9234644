use log::{debug, info};

use crate::{
    config::InventoryConfig,
    construct::Constructor,
    error::{InventoryError, Result},
    expr::Evaluator,
    hosts::expand_hostname_range,
    inventory::InventorySink,
    reader::RecordReader,
    resolve::{AttributeResolver, apply_defaults},
};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PopulateSummary {
    pub rows: usize,
    pub hosts: usize,
}

/// Reads `config.source` and writes every host, group and variable it
/// describes into `sink`.
///
/// A row without a host identifier aborts the run, as does any I/O, CSV or
/// range error. Expression failures abort only when `config.strict` is set.
pub fn populate(
    config: &InventoryConfig,
    sink: &mut dyn InventorySink,
    evaluator: &dyn Evaluator,
) -> Result<PopulateSummary> {
    let reader = RecordReader::open(&config.source, config.delimiter, config.encoding)?;
    if !reader.headers().iter().any(|h| h == &config.host_column) {
        return Err(InventoryError::MissingColumn {
            path: reader.path().to_path_buf(),
            column: config.host_column.clone(),
        });
    }

    let resolver = AttributeResolver::new(config);
    let constructor = Constructor::from_config(evaluator, config);
    let mut summary = PopulateSummary::default();

    for record in reader {
        let record = record?;
        let pattern = record
            .get(&config.host_column)
            .filter(|value| !value.trim().is_empty())
            .ok_or_else(|| InventoryError::MalformedRecord {
                row: record.row,
                reason: format!("'{}' is empty", config.host_column),
            })?;
        let hosts = expand_hostname_range(pattern)?;
        debug!("Row {} expands '{}' to {} host(s)", record.row, pattern, hosts.len());

        for host in &hosts {
            sink.add_host(host);
            let resolved = resolver.resolve(&record);
            let mut vars = resolved.vars;
            apply_defaults(&mut vars, &config.defaults);
            for (key, value) in &vars {
                sink.set_variable(host, key, value.clone());
            }

            constructor.set_composite_vars(&config.compose, &mut vars, host, sink)?;
            constructor.add_host_to_composed_groups(&config.groups, &vars, host, sink)?;
            constructor.add_host_to_keyed_groups(&config.keyed_groups, &vars, host, sink)?;
            constructor.add_host_to_literal_groups(&resolved.groups, host, sink);
        }
        summary.rows += 1;
        summary.hosts += hosts.len();
    }

    info!(
        "Loaded {} host(s) from {} row(s) of {:?}",
        summary.hosts, summary.rows, config.source
    );
    Ok(summary)
}
