//! Session files: hierarchies, selection history and drill positions of one axis.
//!
//! ```toml
//! [[hierarchy]]
//! name = "Time"
//! levels = ["(All)", "Year", "Quarter"]
//! members = ["All/2024/Q1", "All/2024/Q2"]
//! mode = "collapsed"
//!
//! [[selection]]
//! hierarchy = "Time"
//! sign = "include"
//! operator = "descendants"
//! member = "All"
//!
//! [[drill]]
//! position = ["All"]
//! ```
//!
//! Hierarchies are placed on the axis in file order; the n-th path of a
//! drill position names a member of the n-th hierarchy.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::application::error::{ApplicationError, ApplicationResult};
use crate::domain::{
    AxisDimension, DomainError, DrillTree, Evaluator, Expr, Hierarchy, HierarchyBuilder, Member,
    Operator, Resolution, Selection, SelectionTree, Sign, Tuple,
};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HierarchySpec {
    pub name: String,
    pub levels: Vec<String>,
    #[serde(default)]
    pub members: Vec<String>,
    /// Falls back to the configured default mode
    pub mode: Option<Resolution>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SelectionSpec {
    pub hierarchy: String,
    pub sign: Sign,
    #[serde(default = "default_operator")]
    pub operator: Operator,
    pub member: Option<String>,
    pub level: Option<String>,
}

fn default_operator() -> Operator {
    Operator::Member
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DrillSpec {
    pub position: Vec<String>,
}

/// Raw session file contents.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct SessionFile {
    #[serde(default, rename = "hierarchy")]
    pub hierarchies: Vec<HierarchySpec>,
    #[serde(default, rename = "selection")]
    pub selections: Vec<SelectionSpec>,
    #[serde(default, rename = "drill")]
    pub drills: Vec<DrillSpec>,
}

/// One hierarchy on the axis with its selection state.
#[derive(Debug)]
pub struct Dimension {
    pub resolution: Resolution,
    pub selection: SelectionTree,
}

/// Resolved session: metadata, selection trees and drill trie.
#[derive(Debug)]
pub struct Session {
    hierarchies: Vec<Hierarchy>,
    dimensions: Vec<Dimension>,
    drills: DrillTree,
}

impl Session {
    #[instrument(level = "debug")]
    pub fn load(path: &Path, default_mode: Resolution) -> ApplicationResult<Self> {
        let content =
            std::fs::read_to_string(path).map_err(|source| ApplicationError::SessionRead {
                path: path.to_path_buf(),
                source,
            })?;
        let file: SessionFile =
            toml::from_str(&content).map_err(|e| ApplicationError::SessionParse {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?;
        Self::build(&file, default_mode)
    }

    /// Build hierarchies, replay the selection history and record drills.
    pub fn build(file: &SessionFile, default_mode: Resolution) -> ApplicationResult<Self> {
        let mut hierarchies = Vec::with_capacity(file.hierarchies.len());
        let mut dimensions = Vec::with_capacity(file.hierarchies.len());
        for spec in &file.hierarchies {
            if hierarchies.iter().any(|h: &Hierarchy| h.name() == spec.name) {
                return Err(DomainError::DuplicateHierarchy(spec.name.clone()).into());
            }
            let mut builder = HierarchyBuilder::new(&spec.name, &spec.levels);
            for path in &spec.members {
                builder.add_path(path)?;
            }
            hierarchies.push(builder.build());
            dimensions.push(Dimension {
                resolution: spec.mode.unwrap_or(default_mode),
                selection: SelectionTree::new(),
            });
        }

        let mut session = Self {
            hierarchies,
            dimensions,
            drills: DrillTree::new(),
        };
        for (index, spec) in file.selections.iter().enumerate() {
            session.apply(index, spec)?;
        }
        for spec in &file.drills {
            let position = session.position(&spec.position)?;
            session.drills.add(&position);
        }
        debug!(
            hierarchies = session.hierarchies.len(),
            selections = file.selections.len(),
            drills = file.drills.len(),
            "session built"
        );
        Ok(session)
    }

    fn hierarchy_index(&self, name: &str) -> ApplicationResult<usize> {
        self.hierarchies
            .iter()
            .position(|h| h.name() == name)
            .ok_or_else(|| DomainError::UnknownHierarchy(name.to_string()).into())
    }

    fn apply(&mut self, index: usize, spec: &SelectionSpec) -> ApplicationResult<()> {
        let h = self.hierarchy_index(&spec.hierarchy)?;
        let hierarchy = &self.hierarchies[h];
        let action = match (&spec.member, &spec.level) {
            (Some(path), None) => {
                Selection::member(spec.sign, spec.operator, &hierarchy.member(path)?)
            }
            (None, Some(level)) => Selection::level(spec.sign, hierarchy.level_by_name(level)?),
            _ => {
                return Err(ApplicationError::InvalidSelection {
                    index,
                    message: "exactly one of 'member' and 'level' is required".to_string(),
                })
            }
        };
        self.dimensions[h].selection.apply_basic(&action);
        Ok(())
    }

    /// Resolve a drill position given as member paths, one per hierarchy.
    pub fn position(&self, paths: &[String]) -> ApplicationResult<Vec<Member>> {
        if paths.is_empty() || paths.len() > self.hierarchies.len() {
            return Err(DomainError::MalformedPosition {
                message: format!(
                    "{} members for an axis of {} hierarchies",
                    paths.len(),
                    self.hierarchies.len()
                ),
            }
            .into());
        }
        paths
            .iter()
            .zip(&self.hierarchies)
            .map(|(path, hierarchy)| hierarchy.member(path).map_err(Into::into))
            .collect()
    }

    pub fn hierarchies(&self) -> &[Hierarchy] {
        &self.hierarchies
    }

    pub fn dimensions(&self) -> &[Dimension] {
        &self.dimensions
    }

    pub fn drills(&self) -> &DrillTree {
        &self.drills
    }

    pub fn drills_mut(&mut self) -> &mut DrillTree {
        &mut self.drills
    }

    pub fn selection_mut(&mut self, hierarchy: &str) -> ApplicationResult<&mut SelectionTree> {
        let h = self.hierarchy_index(hierarchy)?;
        Ok(&mut self.dimensions[h].selection)
    }

    pub fn axis(&self) -> Vec<AxisDimension<'_>> {
        self.hierarchies
            .iter()
            .zip(&self.dimensions)
            .map(|(h, d)| AxisDimension::new(&d.selection, h.levels(), d.resolution))
            .collect()
    }

    /// The axis expression for the current state.
    #[instrument(level = "debug", skip(self))]
    pub fn compile(&self) -> Expr {
        self.drills.compile_axis_expression(&self.axis())
    }

    /// Tuples the compiled expression denotes.
    pub fn evaluate(&self) -> ApplicationResult<Vec<Tuple>> {
        Ok(Evaluator::new(&self.hierarchies).evaluate(&self.compile())?)
    }

    pub fn visible_positions(&self) -> Vec<Vec<Member>> {
        self.drills.visible_positions(&self.axis())
    }

    /// Minimal replay list per hierarchy.
    pub fn selections(&self) -> Vec<(&Hierarchy, Vec<Selection>)> {
        self.hierarchies
            .iter()
            .zip(&self.dimensions)
            .map(|(h, d)| (h, d.selection.list_selections()))
            .collect()
    }
}
