use std::path::Path;

use anyhow::Context as _;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Catalog {
    pub categories: Vec<Category>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: String,
    pub name: String,
    pub points: Vec<GrammarPoint>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GrammarPoint {
    pub id: String,
    pub name: String,
    pub name_en: String,
}

/// A point resolved against its category and flattened position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PointInfo<'a> {
    pub point: &'a GrammarPoint,
    pub category: &'a Category,
    /// 1-based position in flattened catalog order.
    pub position: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavLink {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Navigation {
    pub prev: Option<NavLink>,
    pub next: Option<NavLink>,
}

impl Catalog {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            anyhow::bail!("catalog file not found: {}", path.display());
        }
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("read catalog: {}", path.display()))?;
        let catalog: Catalog = serde_json::from_str(&raw)
            .with_context(|| format!("parse catalog: {}", path.display()))?;
        catalog
            .check_unique_ids()
            .with_context(|| format!("validate catalog: {}", path.display()))?;
        Ok(catalog)
    }

    fn check_unique_ids(&self) -> anyhow::Result<()> {
        let mut seen = std::collections::HashSet::new();
        for point in self.points() {
            if !seen.insert(point.id.as_str()) {
                anyhow::bail!("duplicate point id: {}", point.id);
            }
        }
        Ok(())
    }

    /// All points in catalog order.
    pub fn points(&self) -> impl Iterator<Item = &GrammarPoint> {
        self.categories.iter().flat_map(|c| c.points.iter())
    }

    pub fn total(&self) -> usize {
        self.categories.iter().map(|c| c.points.len()).sum()
    }

    /// Highest numeric point id. Gaps in the numbering do not lower it.
    pub fn max_point_number(&self) -> Option<u32> {
        self.points().filter_map(|p| p.id.parse().ok()).max()
    }

    /// Ids of catalog points numbered within `start..=end`, ascending.
    pub fn point_ids_in_range(&self, start: u32, end: u32) -> Vec<String> {
        let mut numbered = self
            .points()
            .filter_map(|p| p.id.parse::<u32>().ok().map(|n| (n, p.id.clone())))
            .filter(|(n, _)| (start..=end).contains(n))
            .collect::<Vec<_>>();
        numbered.sort();
        numbered.into_iter().map(|(_, id)| id).collect()
    }

    pub fn find(&self, point_id: &str) -> Option<PointInfo<'_>> {
        let mut position = 0usize;
        for category in &self.categories {
            for point in &category.points {
                position += 1;
                if point.id == point_id {
                    return Some(PointInfo {
                        point,
                        category,
                        position,
                    });
                }
            }
        }
        None
    }

    /// Point at a 1-based flattened position.
    pub fn at_position(&self, position: usize) -> Option<&GrammarPoint> {
        position.checked_sub(1).and_then(|idx| self.points().nth(idx))
    }

    /// Neighbours of the point at `position` in flattened catalog order.
    pub fn navigation(&self, position: usize) -> Navigation {
        let link = |p: &GrammarPoint| NavLink {
            id: p.id.clone(),
            name: p.name.clone(),
        };
        let prev = if position > 1 {
            self.at_position(position - 1).map(link)
        } else {
            None
        };
        let next = if position < self.total() {
            self.at_position(position + 1).map(link)
        } else {
            None
        };
        Navigation { prev, next }
    }

    /// First category whose display name matches; empty when none does.
    pub fn category_id_for_name(&self, name: &str) -> &str {
        self.categories
            .iter()
            .find(|c| c.name == name)
            .map(|c| c.id.as_str())
            .unwrap_or("")
    }
}

/// Zero-pads a numeric id selector to the catalog's two-digit form.
pub fn normalize_point_id(raw: &str) -> anyhow::Result<String> {
    let trimmed = raw.trim();
    let number: u32 = trimmed
        .parse()
        .with_context(|| format!("point id must be numeric: {trimmed:?}"))?;
    Ok(format!("{number:02}"))
}
