// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Top-level runner of rig [feature]s.
//!
//! [feature]: https://cucumber.io/docs/gherkin/reference#feature

use std::{fmt, path::Path};

use cucumber::{cli, writer::Stats as _, World as _};
use futures::FutureExt as _;
use tracing_subscriber::{
    fmt::format::{DefaultFields, Format},
    layer::SubscriberExt as _,
    Layer as _,
};

use crate::{
    broker::{Broker, HttpBroker},
    config::RigOpts,
    connector::Connector,
    suite::Suite,
    world::RigWorld,
};

/// Outcome of a rig run.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct Summary {
    pub passed_steps: usize,
    pub skipped_steps: usize,
    pub failed_steps: usize,
    pub parsing_errors: usize,
    pub hook_errors: usize,
}

impl Summary {
    /// Indicates whether anything went wrong during the run.
    #[must_use]
    pub const fn has_failed(&self) -> bool {
        self.failed_steps > 0
            || self.skipped_steps > 0
            || self.parsing_errors > 0
            || self.hook_errors > 0
    }
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} passed, {} skipped, {} failed steps",
            self.passed_steps, self.skipped_steps, self.failed_steps,
        )?;
        if self.parsing_errors > 0 {
            write!(f, ", {} parsing errors", self.parsing_errors)?;
        }
        if self.hook_errors > 0 {
            write!(f, ", {} hook errors", self.hook_errors)?;
        }
        Ok(())
    }
}

/// Runner of rig [feature]s.
///
/// Scenarios run one at a time, all of them sharing a single [`Suite`]. Every
/// scenario starts on a clean [`RigWorld`], and resources its steps leave
/// open are released once it finishes, whatever its outcome. Once every
/// scenario has run, [`Suite::finish()`] releases the run-wide resources.
///
/// [feature]: https://cucumber.io/docs/gherkin/reference#feature
pub struct Rig {
    connector: Box<dyn Connector>,
    broker: Option<Box<dyn Broker>>,
    opts: Option<RigOpts>,
}

impl fmt::Debug for Rig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Rig")
            .field("broker", &self.broker.is_some())
            .field("opts", &self.opts)
            .finish_non_exhaustive()
    }
}

impl Rig {
    /// Creates a new [`Rig`] creating its controllers with the given
    /// `connector`.
    #[must_use]
    pub fn new(connector: impl Connector + 'static) -> Self {
        Self { connector: Box::new(connector), broker: None, opts: None }
    }

    /// Replaces the [`HttpBroker`] talking to the configured broker URL.
    #[must_use]
    pub fn with_broker(mut self, broker: impl Broker + 'static) -> Self {
        self.broker = Some(Box::new(broker));
        self
    }

    /// Uses the given [`RigOpts`] instead of the ones parsed from the command
    /// line and environment.
    #[must_use]
    pub fn with_opts(mut self, opts: RigOpts) -> Self {
        self.opts = Some(opts);
        self
    }

    /// Runs the [feature]s found at `input`.
    ///
    /// # Panics
    ///
    /// If a global [`tracing`] subscriber is installed already.
    ///
    /// [feature]: https://cucumber.io/docs/gherkin/reference#feature
    pub async fn run(self, input: impl AsRef<Path>) -> Summary {
        let Self { connector, broker, opts } = self;

        let cli = cli::Opts::<_, _, _, RigOpts>::parsed();
        let opts = opts.unwrap_or_else(|| cli.custom.clone());
        let level = opts.log_level;
        let broker = broker
            .unwrap_or_else(|| Box::new(HttpBroker::new(&opts.broker_url)));

        let suite = Suite::new(connector, broker, opts);
        suite.open_consoles();

        let before = suite.clone();
        let writer = RigWorld::cucumber()
            .max_concurrent_scenarios(1)
            .fail_on_skipped()
            .before(move |_, _, scenario, world| {
                tracing::debug!("scenario `{}` begins", scenario.name);
                world.attach(before.clone());
                world.begin_scenario();
                async {}.boxed_local()
            })
            .after(|_, _, scenario, _, world| {
                if let Some(world) = world {
                    world.end_scenario();
                }
                tracing::debug!("scenario `{}` ended", scenario.name);
                async {}.boxed_local()
            })
            .with_cli(cli)
            .configure_and_init_tracing(
                DefaultFields::new(),
                Format::default().with_ansi(false).without_time(),
                move |layer| {
                    tracing_subscriber::registry().with(level.and_then(layer))
                },
            )
            .run(input.as_ref().to_path_buf())
            .await;

        suite.finish().await;

        Summary {
            passed_steps: writer.passed_steps(),
            skipped_steps: writer.skipped_steps(),
            failed_steps: writer.failed_steps(),
            parsing_errors: writer.parsing_errors(),
            hook_errors: writer.hook_errors(),
        }
    }
}
