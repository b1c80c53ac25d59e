//! The diagram view component.
//!
//! A view shows a loading placeholder until the engine has rendered its
//! diagram, then a container embedding the sized SVG. It follows the same
//! Elm-style split as the application:
//! - [`State`]: everything the view knows
//! - [`Message`]: new props, or a finished render
//! - [`update`]: state transition, returning a [`Command`] to run
//! - [`DiagramView`]: runs commands against a [`DiagramEngine`]

mod element;
mod request;

pub use element::{AttributeError, Attributes, CONTAINER_TAG, Element};
pub use request::{RequestTracker, Ticket};

use std::fmt;
use std::sync::Arc;
use std::sync::mpsc::Sender;

use crate::engine::DiagramEngine;
use crate::markup::ensure_sized;

/// Text shown while loading when no placeholder factory is given.
pub const LOADING_TEXT: &str = "Loading...";

/// Builds the element shown while a diagram is loading.
pub type LoadingFactory = Arc<dyn Fn() -> Element + Send + Sync>;

/// Inputs of a view.
#[derive(Clone, Default)]
pub struct Props {
    /// Unique name of the diagram. Used as the id of the rendered SVG.
    pub name: String,
    /// Mermaid source.
    pub code: String,
    /// Placeholder shown before the markup is ready.
    pub loading: Option<LoadingFactory>,
    /// Forwarded to the root container once rendered.
    pub attributes: Attributes,
}

impl Props {
    pub fn new(name: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            code: code.into(),
            loading: None,
            attributes: Attributes::new(),
        }
    }

    #[must_use]
    pub fn with_loading(mut self, factory: impl Fn() -> Element + Send + Sync + 'static) -> Self {
        self.loading = Some(Arc::new(factory));
        self
    }

    #[must_use]
    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(name, value);
        self
    }

    #[must_use]
    pub fn with_attributes(mut self, attributes: Attributes) -> Self {
        self.attributes = attributes;
        self
    }

    /// Whether switching from `self` to `other` needs a new render.
    fn differs_in_request(&self, other: &Self) -> bool {
        self.name != other.name || self.code != other.code
    }
}

impl fmt::Debug for Props {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Props")
            .field("name", &self.name)
            .field("code", &self.code)
            .field("loading", &self.loading.as_ref().map(|_| "<factory>"))
            .field("attributes", &self.attributes)
            .finish()
    }
}

/// Events handled by [`update`].
#[derive(Debug)]
pub enum Message {
    /// The caller supplied new props.
    SetProps(Props),
    /// The engine finished the request identified by `ticket`.
    RenderCompleted { ticket: Ticket, markup: String },
}

/// Work for the runtime to perform after an update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Render {
        ticket: Ticket,
        name: String,
        code: String,
    },
}

/// The complete view state.
#[derive(Debug)]
pub struct State {
    props: Props,
    requests: RequestTracker,
    rendered: Option<String>,
}

impl State {
    /// Create the state for freshly mounted props along with the first render.
    pub fn mount(props: Props) -> (Self, Command) {
        let mut state = Self {
            props,
            requests: RequestTracker::new(),
            rendered: None,
        };
        let command = state.start_request();
        (state, command)
    }

    pub const fn props(&self) -> &Props {
        &self.props
    }

    /// Sized markup of the current request, once available.
    pub fn rendered(&self) -> Option<&str> {
        self.rendered.as_deref()
    }

    pub const fn is_loading(&self) -> bool {
        self.rendered.is_none()
    }

    /// Ticket of the request whose result the view is waiting for or showing.
    pub const fn current_ticket(&self) -> Option<Ticket> {
        self.requests.current()
    }

    /// Build the output for the current state.
    pub fn view(&self) -> Element {
        match &self.rendered {
            None => self
                .props
                .loading
                .as_ref()
                .map_or_else(|| Element::text(LOADING_TEXT), |factory| factory()),
            Some(markup) => Element::Container {
                attributes: self.props.attributes.clone(),
                inner_html: markup.clone(),
            },
        }
    }

    fn start_request(&mut self) -> Command {
        let ticket = self.requests.issue();
        self.rendered = None;
        tracing::debug!(
            name = %self.props.name,
            view = ticket.view_id(),
            generation = ticket.generation(),
            "render requested"
        );
        Command::Render {
            ticket,
            name: self.props.name.clone(),
            code: self.props.code.clone(),
        }
    }
}

/// Apply `msg` to `state`, returning the command to run, if any.
pub fn update(state: &mut State, msg: Message) -> Option<Command> {
    match msg {
        Message::SetProps(props) => {
            let changed = state.props.differs_in_request(&props);
            state.props = props;
            if changed {
                return Some(state.start_request());
            }
        }
        Message::RenderCompleted { ticket, markup } => {
            if !state.requests.is_current(ticket) {
                tracing::debug!(
                    name = %state.props.name,
                    generation = ticket.generation(),
                    "dropping result of superseded render"
                );
                return None;
            }
            match ensure_sized(&markup, &state.props.name) {
                Ok(sized) => state.rendered = Some(sized),
                Err(err) => {
                    tracing::warn!(name = %state.props.name, "{err}");
                }
            }
        }
    }
    None
}

/// A mounted view bound to an engine.
///
/// Engine callbacks post [`Message::RenderCompleted`] into `mailbox`. The
/// owner drains the matching receiver and feeds each message back through
/// [`DiagramView::dispatch`] on its own thread.
pub struct DiagramView {
    state: State,
    engine: Arc<dyn DiagramEngine>,
    mailbox: Sender<Message>,
}

impl DiagramView {
    /// Mount a view and issue its first render request.
    pub fn mount(props: Props, engine: Arc<dyn DiagramEngine>, mailbox: Sender<Message>) -> Self {
        let (state, command) = State::mount(props);
        let view = Self {
            state,
            engine,
            mailbox,
        };
        view.run(command);
        view
    }

    /// Replace the props, re-rendering if the name or code changed.
    pub fn set_props(&mut self, props: Props) {
        self.dispatch(Message::SetProps(props));
    }

    pub fn dispatch(&mut self, msg: Message) {
        if let Some(command) = update(&mut self.state, msg) {
            self.run(command);
        }
    }

    pub const fn state(&self) -> &State {
        &self.state
    }

    pub fn view(&self) -> Element {
        self.state.view()
    }

    fn run(&self, command: Command) {
        match command {
            Command::Render { ticket, name, code } => {
                let mailbox = self.mailbox.clone();
                self.engine.render(
                    &name,
                    &code,
                    Box::new(move |markup| {
                        // The receiver is gone once the view's owner shut down.
                        let _ = mailbox.send(Message::RenderCompleted { ticket, markup });
                    }),
                );
            }
        }
    }
}

/// Turn an arbitrary label into a conservative SVG id.
///
/// Useful for callers that derive names from free text or need to namespace
/// several views on one page.
pub fn sanitize_name(raw: &str) -> String {
    merman::render::sanitize_svg_id(raw)
}
