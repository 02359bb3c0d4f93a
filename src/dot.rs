//! Graphviz output.
//!
//! A `Diagram` is a plain node/edge sink that prints itself as DOT text and
//! can hand that text to the `dot` executable to produce an image. The
//! functions at the bottom map automata (and DFA runs) onto diagrams.

use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::str::FromStr;

use log::{debug, info};

use crate::automaton::{edge_label, Automaton};
use crate::dfa::{Dfa, Simulation};
use crate::error::{Error, Result};
use crate::nfa::Nfa;

pub const DOT_COMMAND: &str = "dot";

pub const START_FILL: &str = "lightblue";
pub const ACCEPTED_COLOR: &str = "green";
pub const REJECTED_COLOR: &str = "red";
pub const DEFAULT_EDGE_COLOR: &str = "black";

const INPUT_NODE: &str = "__input__";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Shape {
    Circle,
    DoubleCircle,
    None,
}

impl Shape {
    fn as_str(self) -> &'static str {
        match self {
            Shape::Circle => "circle",
            Shape::DoubleCircle => "doublecircle",
            Shape::None => "none",
        }
    }
}

/// Node attributes. Unset fields are left to Graphviz.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct NodeStyle {
    pub shape: Option<Shape>,
    pub fill: Option<String>,
    pub label: Option<String>,
    pub xlabel: Option<String>,
    pub font_size: Option<u32>,
    pub font_name: Option<String>,
}

impl NodeStyle {
    pub fn shape(shape: Shape) -> Self {
        NodeStyle {
            shape: Some(shape),
            ..NodeStyle::default()
        }
    }

    pub fn filled<S: Into<String>>(mut self, fill: S) -> Self {
        self.fill = Some(fill.into());
        self
    }

    /// Later settings win, like repeated node statements in Graphviz.
    fn merge(&mut self, other: NodeStyle) {
        macro_rules! take {
            ($($field:ident),*) => {
                $(if other.$field.is_some() {
                    self.$field = other.$field;
                })*
            }
        }
        take!(shape, fill, label, xlabel, font_size, font_name);
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Edge {
    pub from: String,
    pub to: String,
    pub label: String,
    pub color: Option<String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Format {
    Dot,
    Png,
    Svg,
    Pdf,
}

impl Format {
    pub fn extension(self) -> &'static str {
        match self {
            Format::Dot => "dot",
            Format::Png => "png",
            Format::Svg => "svg",
            Format::Pdf => "pdf",
        }
    }
}

impl FromStr for Format {
    type Err = String;

    fn from_str(s: &str) -> ::std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "dot" | "gv" | "graphviz" => Ok(Format::Dot),
            "png" => Ok(Format::Png),
            "svg" => Ok(Format::Svg),
            "pdf" => Ok(Format::Pdf),
            _ => Err(format!("Unknown format: {}. Supported: dot, png, svg, pdf", s)),
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// A directed graph, printed in declaration order.
#[derive(Clone, Debug, Default)]
pub struct Diagram {
    nodes: Vec<(String, NodeStyle)>,
    node_index: HashMap<String, usize>,
    edges: Vec<Edge>,
}

impl Diagram {
    pub fn new() -> Self {
        Diagram::default()
    }

    /// Declaring a node again merges the new attributes into the old ones.
    pub fn add_node<S: Into<String>>(&mut self, id: S, style: NodeStyle) -> &mut Self {
        let id = id.into();
        match self.node_index.get(&id) {
            Some(&idx) => self.nodes[idx].1.merge(style),
            None => {
                self.node_index.insert(id.clone(), self.nodes.len());
                self.nodes.push((id, style));
            }
        }
        self
    }

    pub fn add_edge<F, T, L>(&mut self, from: F, to: T, label: L, color: Option<&str>) -> &mut Self
    where
        F: Into<String>,
        T: Into<String>,
        L: Into<String>,
    {
        self.edges.push(Edge {
            from: from.into(),
            to: to.into(),
            label: label.into(),
            color: color.map(str::to_owned),
        });
        self
    }

    pub fn node(&self, id: &str) -> Option<&NodeStyle> {
        self.node_index.get(id).map(|&idx| &self.nodes[idx].1)
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    /// Writes the diagram next to `path`, with the extension of `format`.
    pub fn render<P: AsRef<Path>>(&self, path: P, format: Format) -> Result<PathBuf> {
        self.render_with(DOT_COMMAND, path, format)
    }

    /// Like `render`, with an explicit Graphviz executable.
    pub fn render_with<P: AsRef<Path>>(&self, dot_command: &str, path: P, format: Format) -> Result<PathBuf> {
        let path = path.as_ref().with_extension(format.extension());
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|source| Error::Write {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        let text = self.to_string();
        match format {
            Format::Dot => fs::write(&path, text).map_err(|source| Error::Write {
                path: path.clone(),
                source,
            })?,
            _ => run_dot(dot_command, &text, &path, format)?,
        }

        info!("rendered {}", path.display());
        Ok(path)
    }
}

fn run_dot(dot_command: &str, source: &str, path: &Path, format: Format) -> Result<()> {
    debug!("running {} -T{} -o {}", dot_command, format, path.display());
    let mut child = Command::new(dot_command)
        .arg(format!("-T{}", format))
        .arg("-o")
        .arg(path)
        .stdin(Stdio::piped())
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(Error::Backend)?;

    // A backend that exits early closes its stdin; its exit status says why.
    if let Some(mut stdin) = child.stdin.take() {
        match stdin.write_all(source.as_bytes()) {
            Err(ref e) if e.kind() == io::ErrorKind::BrokenPipe => {}
            other => other.map_err(Error::Backend)?,
        }
    }

    let output = child.wait_with_output().map_err(Error::Backend)?;
    if !output.status.success() {
        return Err(Error::BackendFailed {
            status: output.status.to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_owned(),
        });
    }
    Ok(())
}

fn quote(s: &str) -> String {
    let mut quoted = String::with_capacity(s.len() + 2);
    quoted.push('"');
    for c in s.chars() {
        match c {
            '"' | '\\' => {
                quoted.push('\\');
                quoted.push(c);
            }
            '\n' => quoted.push_str("\\n"),
            _ => quoted.push(c),
        }
    }
    quoted.push('"');
    quoted
}

impl fmt::Display for Diagram {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "digraph {{")?;
        for (id, style) in &self.nodes {
            let mut attrs = Vec::new();
            if let Some(shape) = style.shape {
                attrs.push(format!("shape={}", shape.as_str()));
            }
            if let Some(ref label) = style.label {
                attrs.push(format!("label={}", quote(label)));
            }
            if let Some(ref xlabel) = style.xlabel {
                attrs.push(format!("xlabel={}", quote(xlabel)));
            }
            if let Some(ref fill) = style.fill {
                attrs.push("style=filled".to_owned());
                attrs.push(format!("fillcolor={}", quote(fill)));
            }
            if let Some(size) = style.font_size {
                attrs.push(format!("fontsize={}", size));
            }
            if let Some(ref font) = style.font_name {
                attrs.push(format!("fontname={}", quote(font)));
            }
            if attrs.is_empty() {
                writeln!(f, "    {};", quote(id))?;
            } else {
                writeln!(f, "    {} [{}];", quote(id), attrs.join(", "))?;
            }
        }
        for edge in &self.edges {
            write!(
                f,
                "    {} -> {} [label={}",
                quote(&edge.from),
                quote(&edge.to),
                quote(&edge.label)
            )?;
            if let Some(ref color) = edge.color {
                write!(f, ", color={}", quote(color))?;
            }
            writeln!(f, "];")?;
        }
        writeln!(f, "}}")
    }
}

fn state_shape(accepting: bool) -> Shape {
    if accepting {
        Shape::DoubleCircle
    } else {
        Shape::Circle
    }
}

/// Accepting states get a double circle, the start state a light blue fill.
pub fn dfa_diagram(dfa: &Dfa) -> Diagram {
    let mut diagram = Diagram::new();
    for (state, name) in dfa.states().iter() {
        diagram.add_node(name, NodeStyle::shape(state_shape(dfa.is_final(state))));
    }
    for (from, symbol, to) in dfa.transitions() {
        diagram.add_edge(
            dfa.state_name(from),
            dfa.state_name(to),
            edge_label(dfa.alphabet().name(symbol)),
            None,
        );
    }
    diagram.add_node(dfa.state_name(dfa.start()), NodeStyle::default().filled(START_FILL));
    diagram
}

/// Shows the input on top, fills the state the run ended in and colours the
/// traversed edges, green for an accepted input and red otherwise.
pub fn dfa_path_diagram(dfa: &Dfa, input: &str, simulation: &Simulation) -> Diagram {
    let color = if simulation.accepted {
        ACCEPTED_COLOR
    } else {
        REJECTED_COLOR
    };

    let mut diagram = Diagram::new();
    diagram.add_node(
        INPUT_NODE,
        NodeStyle {
            shape: Some(Shape::None),
            label: Some(if input.is_empty() { "ε" } else { input }.to_owned()),
            font_size: Some(20),
            font_name: Some("Helvetica-Bold".to_owned()),
            ..NodeStyle::default()
        },
    );
    diagram.add_node(dfa.state_name(dfa.start()), NodeStyle::default().filled(START_FILL));

    let last = simulation.final_state();
    for (state, name) in dfa.states().iter() {
        let mut style = NodeStyle::shape(state_shape(dfa.is_final(state)));
        if state == last {
            style = style.filled(color);
        }
        diagram.add_node(name, style);
    }

    let taken: Vec<_> = simulation.taken_edges().collect();
    for (from, symbol, to) in dfa.transitions() {
        let edge_color = if taken.contains(&(from, symbol)) {
            color
        } else {
            DEFAULT_EDGE_COLOR
        };
        diagram.add_edge(
            dfa.state_name(from),
            dfa.state_name(to),
            edge_label(dfa.alphabet().name(symbol)),
            Some(edge_color),
        );
    }
    diagram
}

/// One edge per target state; epsilon edges are labelled `ε`.
pub fn nfa_diagram(nfa: &Nfa) -> Diagram {
    let mut diagram = Diagram::new();
    for (state, name) in nfa.states().iter() {
        diagram.add_node(name, NodeStyle::shape(state_shape(nfa.is_final(state))));
    }
    for (from, label, to) in nfa.transitions() {
        diagram.add_edge(
            nfa.state_name(from),
            nfa.state_name(to),
            edge_label(nfa.label_name(label)),
            None,
        );
    }
    diagram.add_node(nfa.state_name(nfa.start()), NodeStyle::default().filled(START_FILL));
    diagram
}

/// `nfa_diagram` with every state annotated with its epsilon closure.
pub fn epsilon_nfa_diagram(nfa: &Nfa) -> Diagram {
    let mut diagram = nfa_diagram(nfa);
    let closures = nfa.epsilon_closures();
    for (state, name) in nfa.states().iter() {
        diagram.add_node(
            name,
            NodeStyle {
                xlabel: Some(format!("{{{}}}", closures.names_of(state).join(", "))),
                ..NodeStyle::default()
            },
        );
    }
    diagram
}
