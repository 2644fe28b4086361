use super::binning::{self, BinOptions, Bins, DEFAULT_PRECISION};
use super::metadata::{SampleSpec, TransformRecord};
use super::table::{LabelRecord, LabelTable};
use crate::engines::windowing::Offset;
use crate::error::{LabelcraftError, Result};
use crate::types::{LabelType, Timestamp, Value};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SampleOptions {
    pub seed: u64,
    pub replace: bool,
    pub per_entity: bool,
}

impl LabelTable {
    /// Replace each label with `label >= value`.
    ///
    /// Nulls stay null. Boolean labels pass through unchanged when the most
    /// recent threshold used the same value, so repeating a threshold is a
    /// no-op on the labels.
    pub fn threshold(&self, value: f64) -> Result<LabelTable> {
        let mut table = self.clone();
        table.threshold_in_place(value)?;
        Ok(table)
    }

    pub fn threshold_in_place(&mut self, value: f64) -> Result<()> {
        if value.is_nan() {
            return Err(LabelcraftError::invalid("threshold", "value must not be NaN"));
        }
        let repeated = matches!(
            self.metadata.transforms.iter().rev().find(|t| matches!(t, TransformRecord::Threshold { .. })),
            Some(TransformRecord::Threshold { value: previous }) if *previous == value
        );

        let mut labels = Vec::with_capacity(self.records.len());
        for record in &self.records {
            let label = match &record.label {
                v if v.is_null() => Value::Null,
                Value::Bool(b) if repeated => Value::Bool(*b),
                v => match v.as_f64() {
                    Some(x) => Value::Bool(x >= value),
                    None => {
                        return Err(LabelcraftError::Transform(format!(
                            "threshold needs numeric labels, found '{}' for entity '{}'",
                            v, record.entity
                        )))
                    }
                },
            };
            labels.push(label);
        }

        for (record, label) in self.records.iter_mut().zip(labels) {
            record.label = label;
        }
        self.metadata.label_type = LabelType::Discrete;
        self.push_transform(TransformRecord::Threshold { value });
        Ok(())
    }

    /// Partition continuous labels into ordered categorical bins.
    pub fn bin(&self, bins: impl Into<Bins>, options: BinOptions) -> Result<LabelTable> {
        let mut table = self.clone();
        table.bin_in_place(bins, options)?;
        Ok(table)
    }

    pub fn bin_in_place(&mut self, bins: impl Into<Bins>, options: BinOptions) -> Result<()> {
        let values = self.numeric_labels("bin")?;
        let present: Vec<f64> = values.iter().flatten().copied().collect();

        let bins = bins.into();
        let (edges, include_lowest) = match &bins {
            Bins::Count(0) => {
                return Err(LabelcraftError::invalid("bins", "number of bins must be at least 1"))
            }
            Bins::Count(n) if options.quantiles => (binning::quantile_edges(&present, *n)?, true),
            Bins::Count(n) => {
                let mut edges = binning::equal_width_edges(&present, *n)?;
                binning::widen_open_side(&mut edges, options.right);
                (edges, false)
            }
            Bins::Edges(_) if options.quantiles => {
                return Err(LabelcraftError::invalid(
                    "quantiles",
                    "quantile binning takes a bin count, not explicit edges",
                ))
            }
            Bins::Edges(edges) => {
                binning::check_increasing(edges)?;
                (edges.clone(), false)
            }
        };

        let mut precision = options.precision.unwrap_or(DEFAULT_PRECISION);
        let names = match options.labels {
            Some(labels) if labels.len() != edges.len() - 1 => {
                return Err(LabelcraftError::invalid(
                    "labels",
                    format!("{} labels given for {} bins", labels.len(), edges.len() - 1),
                ))
            }
            Some(labels) => labels,
            None => {
                precision = binning::distinct_precision(&edges, precision)?;
                binning::interval_names(&edges, options.right, include_lowest, precision)
            }
        };

        for (record, value) in self.records.iter_mut().zip(values) {
            record.label = value
                .and_then(|x| binning::assign(&edges, x, options.right, include_lowest))
                .map(|i| Value::String(names[i].clone()))
                .unwrap_or(Value::Null);
        }

        self.metadata.label_type = LabelType::Discrete;
        self.push_transform(TransformRecord::Bin {
            quantiles: options.quantiles,
            right: options.right,
            precision,
            edges,
            labels: names,
        });
        Ok(())
    }

    /// Shift every cutoff `offset` earlier without touching labels.
    pub fn apply_lead(&self, offset: Offset) -> Result<LabelTable> {
        let mut table = self.clone();
        table.apply_lead_in_place(offset)?;
        Ok(table)
    }

    pub fn apply_lead_in_place(&mut self, offset: Offset) -> Result<()> {
        if offset.is_negative() {
            return Err(LabelcraftError::invalid(
                "lead",
                format!("offset must not be negative, got {}", offset),
            ));
        }

        let mut shifted = Vec::with_capacity(self.records.len());
        let mut previous: Option<(&str, Timestamp)> = None;
        for record in &self.records {
            let cutoff = offset.before(record.cutoff);
            let first_event = self
                .metadata
                .entity(&record.entity)
                .and_then(|summary| summary.first_event)
                .ok_or_else(|| {
                    LabelcraftError::invalid(
                        "lead",
                        format!("no first event recorded for entity '{}'", record.entity),
                    )
                })?;
            if cutoff < first_event {
                return Err(LabelcraftError::invalid(
                    "lead",
                    format!(
                        "shifting by {} moves cutoff {} of entity '{}' before its first event {}",
                        offset, record.cutoff, record.entity, first_event
                    ),
                ));
            }
            if let Some((entity, prior)) = previous {
                if entity == record.entity && cutoff < prior {
                    return Err(LabelcraftError::invalid(
                        "lead",
                        format!("cutoffs of entity '{}' would no longer be ordered", entity),
                    ));
                }
            }
            previous = Some((record.entity.as_str(), cutoff));
            shifted.push(cutoff);
        }

        for (record, cutoff) in self.records.iter_mut().zip(shifted) {
            record.cutoff = cutoff;
        }
        self.push_transform(TransformRecord::Lead { offset });
        Ok(())
    }

    /// Reproducible random subset; kept records stay in table order.
    pub fn sample(&self, spec: SampleSpec, options: SampleOptions) -> Result<LabelTable> {
        let mut rng = StdRng::seed_from_u64(options.seed);

        let pools: Vec<Vec<usize>> = if options.per_entity {
            let mut by_entity: Vec<(String, Vec<usize>)> = Vec::new();
            for (i, record) in self.records.iter().enumerate() {
                match by_entity.last_mut() {
                    Some((entity, rows)) if *entity == record.entity => rows.push(i),
                    _ => by_entity.push((record.entity.clone(), vec![i])),
                }
            }
            by_entity.into_iter().map(|(_, rows)| rows).collect()
        } else {
            vec![(0..self.records.len()).collect()]
        };

        let mut chosen: Vec<usize> = Vec::new();
        for pool in &pools {
            match &spec {
                SampleSpec::N(n) => chosen.extend(draw(&mut rng, pool, *n, options.replace)?),
                SampleSpec::Frac(frac) => {
                    if !frac.is_finite() || *frac < 0.0 || (*frac > 1.0 && !options.replace) {
                        return Err(LabelcraftError::invalid(
                            "frac",
                            format!("{} is not a valid fraction without replacement", frac),
                        ));
                    }
                    let n = (frac * pool.len() as f64).round() as usize;
                    chosen.extend(draw(&mut rng, pool, n, options.replace)?);
                }
                SampleSpec::PerLabel(counts) => {
                    let mut by_label: BTreeMap<&str, Vec<usize>> =
                        counts.keys().map(|k| (k.as_str(), Vec::new())).collect();
                    let displays: Vec<String> =
                        pool.iter().map(|&i| self.records[i].label.to_string()).collect();
                    for (&i, display) in pool.iter().zip(&displays) {
                        if let Some(rows) = by_label.get_mut(display.as_str()) {
                            rows.push(i);
                        }
                    }
                    for (label, rows) in by_label {
                        let n = counts.get(label).copied().unwrap_or(0);
                        chosen.extend(draw(&mut rng, &rows, n, options.replace)?);
                    }
                }
            }
        }
        chosen.sort_unstable();

        let records: Vec<LabelRecord> = chosen.iter().map(|&i| self.records[i].clone()).collect();
        let mut table = LabelTable::new(records, self.metadata.clone());
        table.push_transform(TransformRecord::Sample {
            spec,
            seed: options.seed,
            replace: options.replace,
            per_entity: options.per_entity,
            before: self.records.len(),
            after: table.records.len(),
        });
        Ok(table)
    }

    fn numeric_labels(&self, transform: &str) -> Result<Vec<Option<f64>>> {
        self.records
            .iter()
            .map(|record| match &record.label {
                v if v.is_null() => Ok(None),
                v => v.as_f64().map(Some).ok_or_else(|| {
                    LabelcraftError::Transform(format!(
                        "{} needs numeric labels, found '{}' for entity '{}'",
                        transform, v, record.entity
                    ))
                }),
            })
            .collect()
    }
}

fn draw(rng: &mut StdRng, pool: &[usize], n: usize, replace: bool) -> Result<Vec<usize>> {
    if replace {
        if pool.is_empty() {
            return Ok(Vec::new());
        }
        return Ok((0..n).map(|_| pool[rng.gen_range(0..pool.len())]).collect());
    }
    if n > pool.len() {
        return Err(LabelcraftError::invalid(
            "n",
            format!("cannot take {} of {} records without replacement", n, pool.len()),
        ));
    }
    Ok(rand::seq::index::sample(rng, pool.len(), n)
        .into_iter()
        .map(|i| pool[i])
        .collect())
}
