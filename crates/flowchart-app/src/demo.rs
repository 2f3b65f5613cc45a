//! Scripted headless session over a sample approval flow.

use std::cell::RefCell;
use std::rc::Rc;

use flowchart_core::{
    EdgeData, EditorConfig, FlowchartEditor, Key, KeyEvent, Modifiers, NodeData, PointerEvent,
};
use flowchart_render::{FrameScheduler, RecordingSurface};
use kurbo::Point;

use crate::error::AppResult;
use crate::shortcuts::dispatch_key;
use crate::status::StatusBar;

/// What a demo run produced.
#[derive(Debug, Clone, Default)]
pub struct DemoReport {
    pub node_count: usize,
    pub edge_count: usize,
    /// Event names in emission order.
    pub events: Vec<&'static str>,
    pub frames_painted: u64,
    /// Commands issued for the last painted frame.
    pub last_frame_commands: usize,
    /// Text drawn in the last painted frame.
    pub labels: Vec<String>,
    /// Every distinct status line, in order.
    pub status_lines: Vec<String>,
    /// Waypoints of the "yes" branch after the session.
    pub yes_waypoints: Vec<Point>,
}

/// Populate `editor` with a five-step approval flow.
pub fn build_sample_diagram(editor: &mut FlowchartEditor) -> AppResult<()> {
    let nodes = [
        NodeData::new("start", 0.0, 100.0).with_id("start"),
        NodeData::new("process", 200.0, 100.0)
            .with_id("review")
            .with_label("Review request"),
        NodeData::new("condition", 400.0, 100.0)
            .with_id("approved")
            .with_label("Approved?"),
        NodeData::new("end", 640.0, 20.0).with_id("done"),
        NodeData::new("process", 400.0, 260.0)
            .with_id("rework")
            .with_label("Rework"),
    ];
    for node in nodes {
        editor.add_node(node.with_size(120.0, 60.0))?;
    }

    let edges = [
        EdgeData::new("start", "review").with_ports("out", "in"),
        EdgeData::new("review", "approved").with_ports("out", "in"),
        EdgeData::new("approved", "done")
            .with_id("yes")
            .with_ports("out-top", "in")
            .with_waypoints(vec![Point::new(460.0, 50.0)])
            .with_label("yes"),
        EdgeData::new("approved", "rework")
            .with_id("no")
            .with_type("bezier")
            .with_ports("out-bottom", "in")
            .with_label("no"),
    ];
    for edge in edges {
        editor.add_edge(edge)?;
    }
    log::info!(
        "Sample diagram: {} nodes, {} edges",
        editor.diagram().node_count(),
        editor.diagram().edge_count()
    );
    Ok(())
}

/// An editor wired to a frame scheduler, a recording surface and a status bar.
pub struct DemoSession {
    editor: FlowchartEditor,
    scheduler: FrameScheduler,
    last_frame: RecordingSurface,
    status: StatusBar,
    status_lines: Vec<String>,
    events: Rc<RefCell<Vec<&'static str>>>,
}

impl DemoSession {
    pub fn new(config: EditorConfig) -> AppResult<Self> {
        let mut editor = FlowchartEditor::new(config)?;
        let events = Rc::new(RefCell::new(Vec::new()));
        let sink = events.clone();
        editor.subscribe(move |event| sink.borrow_mut().push(event.name()));
        Ok(Self {
            editor,
            scheduler: FrameScheduler::default(),
            last_frame: RecordingSurface::new(),
            status: StatusBar::new(),
            status_lines: Vec::new(),
            events,
        })
    }

    pub fn editor(&self) -> &FlowchartEditor {
        &self.editor
    }

    pub fn editor_mut(&mut self) -> &mut FlowchartEditor {
        &mut self.editor
    }

    pub fn pointer(&mut self, event: PointerEvent) -> AppResult<()> {
        self.editor.handle_pointer(&event);
        self.frame()
    }

    pub fn key(&mut self, event: KeyEvent) -> AppResult<()> {
        dispatch_key(&mut self.editor, &event);
        self.frame()
    }

    /// Run one animation frame and refresh the status bar.
    pub fn frame(&mut self) -> AppResult<()> {
        let mut surface = RecordingSurface::new();
        if self.scheduler.on_animation_frame(&mut self.editor, &mut surface)? {
            self.last_frame = surface;
        }
        if let Some(line) = self.status.update(&self.editor.status()) {
            log::debug!("status: {line}");
            self.status_lines.push(line.to_string());
        }
        Ok(())
    }

    pub fn report(&self) -> DemoReport {
        let diagram = self.editor.diagram();
        DemoReport {
            node_count: diagram.node_count(),
            edge_count: diagram.edge_count(),
            events: self.events.borrow().clone(),
            frames_painted: self.scheduler.frames_painted(),
            last_frame_commands: self.last_frame.commands().len(),
            labels: self.last_frame.texts().into_iter().map(str::to_string).collect(),
            status_lines: self.status_lines.clone(),
            yes_waypoints: diagram
                .edge("yes")
                .map(|edge| edge.waypoints().to_vec())
                .unwrap_or_default(),
        }
    }
}

fn press(c: char) -> KeyEvent {
    KeyEvent::pressed(Key::Char(c))
}

/// Build the sample flow and replay a short editing session over it.
pub fn run_demo(config: EditorConfig) -> AppResult<DemoReport> {
    let mut session = DemoSession::new(config)?;
    build_sample_diagram(session.editor_mut())?;
    session.frame()?;

    session.pointer(PointerEvent::moved(300.0, 400.0))?;

    // Shift-drag the "yes" waypoint; the vertical component is dropped.
    session.pointer(PointerEvent::down(460.0, 50.0))?;
    session.pointer(PointerEvent::moved(500.0, 30.0).with_modifiers(Modifiers::shift()))?;
    session.pointer(PointerEvent::up(500.0, 30.0))?;

    // Move the rework step.
    session.pointer(PointerEvent::down(460.0, 290.0))?;
    session.pointer(PointerEvent::moved(480.0, 300.0))?;
    session.pointer(PointerEvent::up(480.0, 300.0))?;

    // Rubber-band the review and decision steps.
    session.pointer(PointerEvent::down(180.0, 80.0))?;
    session.pointer(PointerEvent::moved(540.0, 180.0))?;
    session.pointer(PointerEvent::up(540.0, 180.0))?;

    session.key(press('+'))?;
    session.key(press('g'))?;
    session.key(press('f'))?;
    session.key(KeyEvent::pressed(Key::Escape))?;

    let report = session.report();
    log::info!(
        "Demo finished: {} events, {} frames",
        report.events.len(),
        report.frames_painted
    );
    Ok(report)
}
