//! Guided chatbot: a tree of canned options walked one choice at a time

use serde::{Deserialize, Serialize};

use crate::error::MessagingError;

pub const NOT_INITIALIZED_RESPONSE: &str = "Chat not initialized. Please try again.";

/// One step of the guided chat
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatNode {
    pub id: u32,
    pub button_label: String,
    pub label_text: String,
    pub response: String,
    pub children: Vec<ChatNode>,
}

impl ChatNode {
    pub fn new(id: u32, button_label: &str, label_text: &str, response: &str) -> Self {
        Self {
            id,
            button_label: button_label.to_string(),
            label_text: label_text.to_string(),
            response: response.to_string(),
            children: Vec::new(),
        }
    }

    pub fn with_child(mut self, child: ChatNode) -> Self {
        self.children.push(child);
        self
    }
}

/// The tree a new session starts from
pub fn default_tree() -> ChatNode {
    ChatNode::new(1, "Start Chat", "Welcome", "Welcome to the chat bot. How can I help you?")
        .with_child(
            ChatNode::new(2, "Orders", "Orders", "What would you like to know about your orders?")
                .with_child(ChatNode::new(
                    5,
                    "Track an order",
                    "Tracking",
                    "Open your order history and select an order to see its tracking checkpoints.",
                ))
                .with_child(ChatNode::new(
                    6,
                    "Payment methods",
                    "Payment",
                    "You can pay by card, from your wallet balance or in cash on delivery.",
                )),
        )
        .with_child(
            ChatNode::new(3, "Basket", "Basket", "How can I help with your basket?").with_child(ChatNode::new(
                7,
                "Promo codes",
                "Promo codes",
                "Enter a promo code on the basket page before checking out. Codes are not case sensitive.",
            )),
        )
        .with_child(ChatNode::new(
            4,
            "Contracts",
            "Contracts",
            "Borrowed products come with a contract. An active contract can be renewed once from its details page.",
        ))
}

/// A user's position in the chat tree
#[derive(Debug, Clone)]
pub struct ChatSession {
    root: ChatNode,
    /// Child indexes from the root to the current node
    path: Vec<usize>,
    active: bool,
}

impl Default for ChatSession {
    fn default() -> Self {
        Self::new(default_tree())
    }
}

impl ChatSession {
    pub fn new(root: ChatNode) -> Self {
        Self {
            root,
            path: Vec::new(),
            active: false,
        }
    }

    /// Starts (or restarts) the chat at the root node
    pub fn initialize_chat(&mut self) -> &ChatNode {
        self.path.clear();
        self.active = true;
        &self.root
    }

    pub fn is_interaction_active(&self) -> bool {
        self.active
    }

    fn current(&self) -> Option<&ChatNode> {
        if !self.active {
            return None;
        }
        self.path
            .iter()
            .try_fold(&self.root, |node, &index| node.children.get(index))
    }

    /// Moves to the child option with `option_id`
    pub fn select_option(&mut self, option_id: u32) -> Result<&ChatNode, MessagingError> {
        let index = self
            .current()
            .and_then(|node| node.children.iter().position(|child| child.id == option_id))
            .ok_or(MessagingError::UnknownOption(option_id))?;
        self.path.push(index);
        self.current().ok_or(MessagingError::UnknownOption(option_id))
    }

    /// Options offered at the current node; empty before initialization
    pub fn current_options(&self) -> &[ChatNode] {
        self.current().map(|node| node.children.as_slice()).unwrap_or(&[])
    }

    pub fn current_response(&self) -> &str {
        self.current()
            .map(|node| node.response.as_str())
            .unwrap_or(NOT_INITIALIZED_RESPONSE)
    }
}
