//! Reader for the CVRPLIB text format.
//!
//! ```text
//! NAME : A-n32-k5
//! TYPE : CVRP
//! DIMENSION : 32
//! EDGE_WEIGHT_TYPE : EUC_2D
//! CAPACITY : 100
//! NODE_COORD_SECTION
//!  1 82 76
//!  ...
//! DEMAND_SECTION
//!  1 0
//!  ...
//! DEPOT_SECTION
//!  1
//!  -1
//! EOF
//! ```
//!
//! Node ids become customer ids. `EUC_2D` distances are rounded to the
//! nearest integer, the convention the published optima are computed with.

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::Path;

use anyhow::{anyhow, bail, Context, Result};

use crate::models::{Customer, Fleet, Instance, InstanceBuilder, Point};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Header,
    Coordinates,
    Demands,
    Depots,
}

/// Reads an instance file.
pub fn load(path: impl AsRef<Path>) -> Result<Instance> {
    let path = path.as_ref();
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    parse_str(&text).with_context(|| format!("failed to parse {}", path.display()))
}

/// Parses an instance from CVRPLIB text.
///
/// The vehicle count comes from the `VEHICLES` header when present, then
/// from a `-kN` name suffix, and otherwise equals the number of customers.
///
/// # Examples
///
/// ```
/// use u_ecoroute::benchmark::vrplib;
///
/// let text = "NAME : tiny-n3-k1\nDIMENSION : 3\nCAPACITY : 10\n\
///             EDGE_WEIGHT_TYPE : EUC_2D\nNODE_COORD_SECTION\n\
///             1 0 0\n2 3 4\n3 0 2\nDEMAND_SECTION\n1 0\n2 4\n3 5\n\
///             DEPOT_SECTION\n1\n-1\nEOF\n";
/// let instance = vrplib::parse_str(text).unwrap();
///
/// assert_eq!(instance.name(), "tiny-n3-k1");
/// assert_eq!(instance.num_customers(), 2);
/// assert_eq!(instance.fleet().total_vehicles(), 1);
/// assert!((instance.distance(0, 1) - 5.0).abs() < 1e-10);
/// ```
pub fn parse_str(text: &str) -> Result<Instance> {
    let mut header: HashMap<String, String> = HashMap::new();
    let mut coordinates: BTreeMap<usize, Point> = BTreeMap::new();
    let mut demands: HashMap<usize, i32> = HashMap::new();
    let mut depots: Vec<usize> = Vec::new();
    let mut section = Section::Header;

    for (index, raw) in text.lines().enumerate() {
        let lineno = index + 1;
        let line = raw.trim();
        if line.is_empty() {
            continue;
        }
        match line {
            "EOF" => break,
            "NODE_COORD_SECTION" => {
                section = Section::Coordinates;
                continue;
            }
            "DEMAND_SECTION" => {
                section = Section::Demands;
                continue;
            }
            "DEPOT_SECTION" => {
                section = Section::Depots;
                continue;
            }
            _ => {}
        }

        match section {
            Section::Header => {
                let (key, value) = line
                    .split_once(':')
                    .ok_or_else(|| anyhow!("line {lineno}: expected 'KEY : value', got '{line}'"))?;
                header.insert(key.trim().to_ascii_uppercase(), value.trim().to_string());
            }
            Section::Coordinates => {
                let fields = numbers::<f64>(line)
                    .with_context(|| format!("line {lineno}: bad NODE_COORD_SECTION entry"))?;
                let [id, x, y] = fields[..] else {
                    bail!("line {lineno}: expected 'id x y', got '{line}'");
                };
                coordinates.insert(node_id(id, lineno)?, Point::new(x, y));
            }
            Section::Demands => {
                let fields = numbers::<i64>(line)
                    .with_context(|| format!("line {lineno}: bad DEMAND_SECTION entry"))?;
                let [id, demand] = fields[..] else {
                    bail!("line {lineno}: expected 'id demand', got '{line}'");
                };
                let id = usize::try_from(id)
                    .with_context(|| format!("line {lineno}: negative node id {id}"))?;
                let demand = i32::try_from(demand)
                    .with_context(|| format!("line {lineno}: demand {demand} out of range"))?;
                demands.insert(id, demand);
            }
            Section::Depots => {
                let id: i64 = line
                    .parse()
                    .with_context(|| format!("line {lineno}: bad DEPOT_SECTION entry '{line}'"))?;
                if id == -1 {
                    section = Section::Header;
                } else {
                    depots.push(
                        usize::try_from(id)
                            .with_context(|| format!("line {lineno}: bad depot id {id}"))?,
                    );
                }
            }
        }
    }

    let name = header.get("NAME").cloned().unwrap_or_else(|| "unnamed".to_string());

    if let Some(kind) = header.get("EDGE_WEIGHT_TYPE") {
        if kind != "EUC_2D" {
            bail!("unsupported EDGE_WEIGHT_TYPE '{kind}' (only EUC_2D)");
        }
    }

    let capacity: i32 = header
        .get("CAPACITY")
        .ok_or_else(|| anyhow!("missing CAPACITY"))?
        .parse()
        .context("CAPACITY is not an integer")?;

    if let Some(dimension) = header.get("DIMENSION") {
        let dimension: usize = dimension.parse().context("DIMENSION is not an integer")?;
        if dimension != coordinates.len() {
            bail!(
                "DIMENSION is {dimension} but NODE_COORD_SECTION lists {} nodes",
                coordinates.len()
            );
        }
    }

    let depot = match depots.as_slice() {
        [] => *coordinates
            .keys()
            .next()
            .ok_or_else(|| anyhow!("NODE_COORD_SECTION is empty"))?,
        [depot] => *depot,
        _ => bail!("multiple depots are not supported"),
    };
    let depot_point = *coordinates
        .get(&depot)
        .ok_or_else(|| anyhow!("depot {depot} has no coordinates"))?;

    let num_customers = coordinates.len() - 1;
    let vehicles = match header.get("VEHICLES") {
        Some(v) => v.parse().context("VEHICLES is not an integer")?,
        None => vehicles_from_name(&name).unwrap_or(num_customers),
    };

    let mut builder = InstanceBuilder::new(name);
    builder.depot(depot_point);
    for (&id, &point) in coordinates.iter().filter(|&(&id, _)| id != depot) {
        let demand = *demands
            .get(&id)
            .ok_or_else(|| anyhow!("node {id} has no DEMAND_SECTION entry"))?;
        builder
            .add_customer(Customer::new(id, point, demand))
            .with_context(|| format!("invalid node {id}"))?;
    }
    builder
        .fleet(Fleet::homogeneous(capacity, vehicles))
        .distance_fn(|a, b| a.euclidean(b).round());
    builder.build().context("invalid instance")
}

/// Vehicle count encoded as a `-kN` name suffix, e.g. `A-n32-k5`.
pub fn vehicles_from_name(name: &str) -> Option<usize> {
    name.rsplit('-').next()?.strip_prefix('k')?.parse().ok()
}

fn numbers<T: std::str::FromStr>(line: &str) -> Result<Vec<T>>
where
    T::Err: std::error::Error + Send + Sync + 'static,
{
    line.split_whitespace()
        .map(|token| {
            token
                .parse::<T>()
                .with_context(|| format!("'{token}' is not a number"))
        })
        .collect()
}

fn node_id(value: f64, lineno: usize) -> Result<usize> {
    if value >= 0.0 && value.fract() == 0.0 {
        Ok(value as usize)
    } else {
        bail!("line {lineno}: node id {value} is not a non-negative integer")
    }
}
