//! Node type catalog.

use serde::{Deserialize, Serialize};

use super::port::{Port, PortSide};
use crate::style::{NodeStyle, SerializableColor};

/// Outline family used to draw and hit-test a node.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Silhouette {
    /// Rectangle with fully rounded ends.
    Stadium,
    /// Rectangle with the given corner radius.
    RoundedRect(f64),
    /// Rhombus inscribed in the bounds.
    Diamond,
    /// Ellipse inscribed in the bounds.
    Ellipse,
}

/// All supported node types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NodeKind {
    Start,
    End,
    Process,
    Approval,
    Condition,
    UserTask,
    ServiceTask,
    ScriptTask,
    ManualTask,
    ParallelGateway,
    ExclusiveGateway,
    InclusiveGateway,
    EventGateway,
    TimerEvent,
    MessageEvent,
    SignalEvent,
}

impl NodeKind {
    pub const ALL: [NodeKind; 16] = [
        NodeKind::Start,
        NodeKind::End,
        NodeKind::Process,
        NodeKind::Approval,
        NodeKind::Condition,
        NodeKind::UserTask,
        NodeKind::ServiceTask,
        NodeKind::ScriptTask,
        NodeKind::ManualTask,
        NodeKind::ParallelGateway,
        NodeKind::ExclusiveGateway,
        NodeKind::InclusiveGateway,
        NodeKind::EventGateway,
        NodeKind::TimerEvent,
        NodeKind::MessageEvent,
        NodeKind::SignalEvent,
    ];

    /// Type tag used by factories and events.
    pub fn tag(self) -> &'static str {
        match self {
            NodeKind::Start => "start",
            NodeKind::End => "end",
            NodeKind::Process => "process",
            NodeKind::Approval => "approval",
            NodeKind::Condition => "condition",
            NodeKind::UserTask => "user-task",
            NodeKind::ServiceTask => "service-task",
            NodeKind::ScriptTask => "script-task",
            NodeKind::ManualTask => "manual-task",
            NodeKind::ParallelGateway => "parallel-gateway",
            NodeKind::ExclusiveGateway => "exclusive-gateway",
            NodeKind::InclusiveGateway => "inclusive-gateway",
            NodeKind::EventGateway => "event-gateway",
            NodeKind::TimerEvent => "timer-event",
            NodeKind::MessageEvent => "message-event",
            NodeKind::SignalEvent => "signal-event",
        }
    }

    /// Look up a kind by its tag.
    pub fn from_tag(tag: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.tag() == tag)
    }

    pub fn is_gateway(self) -> bool {
        matches!(
            self,
            NodeKind::Condition
                | NodeKind::ParallelGateway
                | NodeKind::ExclusiveGateway
                | NodeKind::InclusiveGateway
                | NodeKind::EventGateway
        )
    }

    pub fn is_event(self) -> bool {
        matches!(
            self,
            NodeKind::TimerEvent | NodeKind::MessageEvent | NodeKind::SignalEvent
        )
    }

    pub fn silhouette(self) -> Silhouette {
        match self {
            NodeKind::Start | NodeKind::End => Silhouette::Stadium,
            _ if self.is_gateway() => Silhouette::Diamond,
            _ if self.is_event() => Silhouette::Ellipse,
            _ => Silhouette::RoundedRect(6.0),
        }
    }

    /// Default `(fill, stroke)` colors.
    pub fn colors(self) -> (SerializableColor, SerializableColor) {
        let (fill, stroke) = match self {
            NodeKind::Start | NodeKind::ScriptTask | NodeKind::InclusiveGateway => {
                ((0xeb, 0xfa, 0xeb), (0x52, 0xc4, 0x1a))
            }
            NodeKind::End => ((0xfd, 0xe8, 0xe8), (0xe5, 0x48, 0x48)),
            NodeKind::ExclusiveGateway => ((0xfd, 0xe8, 0xe8), (0xf5, 0x22, 0x2d)),
            NodeKind::Approval | NodeKind::ParallelGateway => {
                ((0xe6, 0xf7, 0xff), (0x18, 0x90, 0xff))
            }
            NodeKind::Condition | NodeKind::TimerEvent => ((0xff, 0xf9, 0xe6), (0xfa, 0xad, 0x14)),
            NodeKind::Process | NodeKind::EventGateway => ((0xf4, 0xf0, 0xff), (0x72, 0x2e, 0xd1)),
            NodeKind::UserTask | NodeKind::MessageEvent => ((0xe6, 0xff, 0xfe), (0x13, 0xc2, 0xc2)),
            NodeKind::ServiceTask | NodeKind::SignalEvent => {
                ((0xff, 0xf0, 0xf8), (0xeb, 0x2f, 0x96))
            }
            NodeKind::ManualTask => ((0xff, 0xf2, 0xe6), (0xfa, 0x8c, 0x16)),
        };
        (
            SerializableColor::rgb(fill.0, fill.1, fill.2),
            SerializableColor::rgb(stroke.0, stroke.1, stroke.2),
        )
    }

    pub fn font_size(self) -> f64 {
        match self {
            NodeKind::Process | NodeKind::Approval => 12.0,
            NodeKind::Start
            | NodeKind::End
            | NodeKind::Condition
            | NodeKind::UserTask
            | NodeKind::ServiceTask
            | NodeKind::ScriptTask
            | NodeKind::ManualTask => 11.0,
            _ => 10.0,
        }
    }

    /// Default style derived from the catalog.
    pub fn default_style(self) -> NodeStyle {
        let (fill, stroke) = self.colors();
        NodeStyle {
            fill,
            stroke,
            font_size: self.font_size(),
            bold: matches!(self, NodeKind::Start | NodeKind::End),
            ..NodeStyle::default()
        }
    }

    /// Default label shown when none is given.
    pub fn default_label(self) -> &'static str {
        match self {
            NodeKind::Start => "Start",
            NodeKind::End => "End",
            NodeKind::Process => "Process",
            NodeKind::Approval => "Approval",
            NodeKind::Condition => "Condition",
            NodeKind::UserTask => "User Task",
            NodeKind::ServiceTask => "Service Task",
            NodeKind::ScriptTask => "Script Task",
            NodeKind::ManualTask => "Manual Task",
            NodeKind::ParallelGateway => "Parallel",
            NodeKind::ExclusiveGateway => "Exclusive",
            NodeKind::InclusiveGateway => "Inclusive",
            NodeKind::EventGateway => "Event",
            NodeKind::TimerEvent => "Timer",
            NodeKind::MessageEvent => "Message",
            NodeKind::SignalEvent => "Signal",
        }
    }

    /// Default anchor layout.
    pub fn default_ports(self) -> Vec<Port> {
        let input = || Port::input("in", PortSide::Left);
        let output = |id: &str, side| Port::output(id, side);
        match self {
            NodeKind::Start => vec![output("out", PortSide::Right)],
            NodeKind::End => vec![input()],
            _ if self.is_gateway() => vec![
                input(),
                output("out", PortSide::Right),
                output("out-top", PortSide::Top),
                output("out-bottom", PortSide::Bottom),
            ],
            _ => vec![input(), output("out", PortSide::Right)],
        }
    }
}

impl std::fmt::Display for NodeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.tag())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tags_roundtrip() {
        for kind in NodeKind::ALL {
            assert_eq!(NodeKind::from_tag(kind.tag()), Some(kind));
        }
        assert_eq!(NodeKind::from_tag("hexagon"), None);
    }

    #[test]
    fn test_serde_uses_tags() {
        let json = serde_json::to_string(&NodeKind::UserTask).unwrap();
        assert_eq!(json, "\"user-task\"");
    }

    #[test]
    fn test_default_ports() {
        assert_eq!(NodeKind::Start.default_ports().len(), 1);
        assert_eq!(NodeKind::Start.default_ports()[0].side, PortSide::Right);
        assert_eq!(NodeKind::End.default_ports()[0].side, PortSide::Left);
        assert_eq!(NodeKind::Process.default_ports().len(), 2);
        assert_eq!(NodeKind::Condition.default_ports().len(), 4);
    }

    #[test]
    fn test_catalog_colors() {
        let (fill, stroke) = NodeKind::Process.colors();
        assert_eq!(fill, SerializableColor::rgb(0xf4, 0xf0, 0xff));
        assert_eq!(stroke, SerializableColor::rgb(0x72, 0x2e, 0xd1));
        assert!(NodeKind::Start.default_style().bold);
        assert!((NodeKind::TimerEvent.font_size() - 10.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_silhouettes() {
        assert_eq!(NodeKind::Start.silhouette(), Silhouette::Stadium);
        assert_eq!(NodeKind::ExclusiveGateway.silhouette(), Silhouette::Diamond);
        assert_eq!(NodeKind::SignalEvent.silhouette(), Silhouette::Ellipse);
        assert!(matches!(
            NodeKind::UserTask.silhouette(),
            Silhouette::RoundedRect(_)
        ));
    }
}
