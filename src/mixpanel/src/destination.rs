use chrono::Utc;
use serde_json::Value;
use tracing::debug;
use uaparser::UserAgentParser;

use crate::error::Result;
use crate::event::Alias;
use crate::event::Context;
use crate::event::Group;
use crate::event::Identify;
use crate::event::PageView;
use crate::event::Surface;
use crate::event::Track;
use crate::plan;
use crate::plan::RequestStep;
use crate::response;
use crate::settings::Settings;
use crate::transport;
use crate::transport::Transport;
use crate::ua;
use crate::ua::UserAgentInfo;

/// The Mixpanel destination. Each public operation validates, plans its
/// calls and drives them through the transport in order.
pub struct Mixpanel<T> {
    settings: Settings,
    transport: T,
    ua_parser: Option<UserAgentParser>,
}

impl<T: Transport> Mixpanel<T> {
    pub fn new(settings: Settings, transport: T) -> Self {
        Mixpanel {
            settings,
            transport,
            ua_parser: None,
        }
    }

    pub fn with_ua_parser(mut self, parser: UserAgentParser) -> Self {
        self.ua_parser = Some(parser);
        self
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub async fn identify(&self, mut event: Identify) -> Result<Vec<Value>> {
        let now = Utc::now();
        event.common.timestamp.get_or_insert(now);
        crate::validate::preflight(&self.settings, event.common.timestamp(), now, false)?;

        let ua = self.ua_info(&event.common.context);
        let steps = plan::identify_plan(&event, ua.as_ref(), &self.settings)?;
        self.run(steps).await
    }

    pub async fn track(&self, mut event: Track) -> Result<Vec<Value>> {
        let now = Utc::now();
        event.common.timestamp.get_or_insert(now);
        crate::validate::preflight(&self.settings, event.common.timestamp(), now, true)?;

        let ua = self.ua_info(&event.common.context);
        let steps = plan::track_plan(&event, ua.as_ref(), &self.settings, now)?;
        self.run(steps).await
    }

    pub async fn page(&self, view: PageView) -> Result<Vec<Value>> {
        self.view(Surface::Page, view).await
    }

    pub async fn screen(&self, view: PageView) -> Result<Vec<Value>> {
        self.view(Surface::Screen, view).await
    }

    async fn view(&self, surface: Surface, mut view: PageView) -> Result<Vec<Value>> {
        let now = Utc::now();
        view.common.timestamp.get_or_insert(now);
        // only screen calls require the access key for import routing;
        // page calls dispatch and let the endpoint decide
        let needs_key = surface == Surface::Screen;
        crate::validate::preflight(&self.settings, view.common.timestamp(), now, needs_key)?;

        let ua = self.ua_info(&view.common.context);
        let steps = plan::page_plan(&view, surface, ua.as_ref(), &self.settings, now)?;
        self.run(steps).await
    }

    pub async fn alias(&self, mut event: Alias) -> Result<Vec<Value>> {
        let now = Utc::now();
        event.common.timestamp.get_or_insert(now);
        crate::validate::preflight(&self.settings, event.common.timestamp(), now, false)?;

        let steps = plan::alias_plan(&event, &self.settings)?;
        self.run(steps).await
    }

    pub async fn group(&self, mut event: Group) -> Result<Vec<Value>> {
        let now = Utc::now();
        event.common.timestamp.get_or_insert(now);
        crate::validate::preflight(&self.settings, event.common.timestamp(), now, false)?;

        let steps = plan::group_plan(&event, &self.settings)?;
        self.run(steps).await
    }

    /// Sequential driver: steps run in plan order, the first failure is
    /// the operation's result and later steps are never issued.
    async fn run(&self, steps: Vec<RequestStep>) -> Result<Vec<Value>> {
        let mut results = Vec::with_capacity(steps.len());
        for step in steps {
            let query = transport::step_query(&step, &self.settings)?;
            debug!(endpoint = step.endpoint.path(), "dispatching call");
            let body = self.transport.post(step.endpoint.path(), &query).await?;
            results.push(response::interpret(body)?);
        }
        Ok(results)
    }

    fn ua_info(&self, context: &Context) -> Option<UserAgentInfo> {
        let parser = self.ua_parser.as_ref()?;
        let raw = context.user_agent.as_ref()?;
        Some(ua::parse(parser, raw))
    }
}
