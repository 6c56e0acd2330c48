//! In-process transport.
//!
//! A `LoopbackHub` pairs contexts living in the same process. Contexts that `listen`
//! accept incoming connections; any context can connect to a listening one. The hub
//! can sever links (as a navigating host does), refuse contexts, and fail a number of
//! upcoming connection attempts.
//!
//! A closed link is dropped from the hub once both of its ports have let go of it,
//! either by closing or by observing the disconnect.

use std::{
    cell::RefCell,
    collections::{BTreeSet, HashMap, VecDeque},
    rc::Rc,
};

use super::transport::{ContextId, Port, PortEvent, Transport};
use crate::errors::ChannelError;

#[derive(Debug)]
struct Link {
    ends: [ContextId; 2],
    inbox: [VecDeque<String>; 2],
    open: bool,
    released: [bool; 2],
}

/// Connection offered to a listening context.
#[derive(Debug)]
pub struct Incoming {
    pub port: LoopbackPort,
    pub peer: ContextId,
    pub name: String,
}

#[derive(Debug, Default)]
struct HubState {
    links: HashMap<usize, Link>,
    next_link: usize,
    listening: HashMap<ContextId, VecDeque<Incoming>>,
    refused: BTreeSet<ContextId>,
    fail_next: usize,
    connect_attempts: usize,
}

impl HubState {
    fn release(&mut self, id: usize, side: usize) {
        let Some(link) = self.links.get_mut(&id) else {
            return;
        };
        link.released[side] = true;
        if !link.open && link.released.iter().all(|r| *r) {
            self.links.remove(&id);
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct LoopbackHub {
    inner: Rc<RefCell<HubState>>,
}

impl LoopbackHub {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn transport(&self, local: ContextId) -> LoopbackTransport {
        LoopbackTransport {
            hub: self.clone(),
            local,
        }
    }

    pub fn listen(&self, context: ContextId) {
        self.inner
            .borrow_mut()
            .listening
            .entry(context)
            .or_default();
    }

    /// Connections that arrived for `context` since the last call.
    pub fn accept(&self, context: &ContextId) -> Vec<Incoming> {
        self.inner
            .borrow_mut()
            .listening
            .get_mut(context)
            .map(|q| q.drain(..).collect())
            .unwrap_or_default()
    }

    /// Drops every link touching `context`. Both ends observe a disconnect.
    pub fn sever(&self, context: &ContextId) {
        let mut state = self.inner.borrow_mut();
        for link in state.links.values_mut().filter(|l| l.ends.contains(context)) {
            link.open = false;
        }
    }

    /// Makes connection attempts to `context` fail until [`LoopbackHub::admit`].
    pub fn refuse(&self, context: ContextId) {
        self.inner.borrow_mut().refused.insert(context);
    }

    pub fn admit(&self, context: &ContextId) {
        self.inner.borrow_mut().refused.remove(context);
    }

    pub fn fail_next_connects(&self, count: usize) {
        self.inner.borrow_mut().fail_next = count;
    }

    pub fn connect_attempts(&self) -> usize {
        self.inner.borrow().connect_attempts
    }

    pub fn open_links(&self) -> usize {
        self.inner.borrow().links.values().filter(|l| l.open).count()
    }

    /// Links still held by the hub, open or waiting for a port to let go.
    pub fn link_count(&self) -> usize {
        self.inner.borrow().links.len()
    }
}

#[derive(Debug)]
pub struct LoopbackTransport {
    hub: LoopbackHub,
    local: ContextId,
}

impl LoopbackTransport {
    pub fn local(&self) -> &ContextId {
        &self.local
    }
}

impl Transport for LoopbackTransport {
    type Port = LoopbackPort;

    fn connect(&mut self, target: &ContextId, name: &str) -> Result<LoopbackPort, ChannelError> {
        let mut state = self.hub.inner.borrow_mut();
        state.connect_attempts += 1;

        if state.fail_next > 0 {
            state.fail_next -= 1;
            return Err(ChannelError::Unreachable(target.to_string()));
        }
        if state.refused.contains(target) || !state.listening.contains_key(target) {
            return Err(ChannelError::Unreachable(target.to_string()));
        }

        let link = state.next_link;
        state.next_link += 1;
        state.links.insert(
            link,
            Link {
                ends: [self.local.clone(), target.clone()],
                inbox: [VecDeque::new(), VecDeque::new()],
                open: true,
                released: [false; 2],
            },
        );

        let remote = LoopbackPort {
            hub: self.hub.clone(),
            link,
            side: 1,
            notified: false,
        };
        if let Some(queue) = state.listening.get_mut(target) {
            queue.push_back(Incoming {
                port: remote,
                peer: self.local.clone(),
                name: name.to_string(),
            });
        }

        Ok(LoopbackPort {
            hub: self.hub.clone(),
            link,
            side: 0,
            notified: false,
        })
    }
}

#[derive(Debug)]
pub struct LoopbackPort {
    hub: LoopbackHub,
    link: usize,
    side: usize,
    notified: bool,
}

impl Port for LoopbackPort {
    fn post(&mut self, raw: &str) -> Result<(), ChannelError> {
        let mut state = self.hub.inner.borrow_mut();
        let link = state
            .links
            .get_mut(&self.link)
            .ok_or(ChannelError::Disconnected)?;
        if !link.open {
            return Err(ChannelError::Disconnected);
        }
        link.inbox[1 - self.side].push_back(raw.to_string());
        Ok(())
    }

    fn poll(&mut self) -> Vec<PortEvent> {
        let mut state = self.hub.inner.borrow_mut();
        let (mut events, open) = match state.links.get_mut(&self.link) {
            Some(link) => (
                link.inbox[self.side]
                    .drain(..)
                    .map(PortEvent::Message)
                    .collect::<Vec<_>>(),
                link.open,
            ),
            None => (Vec::new(), false),
        };
        if !open && !self.notified {
            self.notified = true;
            events.push(PortEvent::Disconnected);
            state.release(self.link, self.side);
        }
        events
    }

    fn close(&mut self) {
        self.notified = true;
        let mut state = self.hub.inner.borrow_mut();
        if let Some(link) = state.links.get_mut(&self.link) {
            link.open = false;
        }
        state.release(self.link, self.side);
    }
}
