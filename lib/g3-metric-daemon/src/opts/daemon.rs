/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use clap::{Arg, ArgAction, ArgMatches, Command};

const ARGS_VERBOSE: &str = "verbose";
const ARGS_TEST_CONFIG: &str = "test-config";

pub trait DaemonArgsExt {
    fn append_daemon_args(self) -> Self;
}

#[derive(Debug)]
pub struct DaemonArgs {
    pub verbose_level: u8,
    pub process_name: &'static str,
    pub test_config: bool,
}

impl DaemonArgs {
    pub fn new(process_name: &'static str) -> Self {
        DaemonArgs {
            verbose_level: 0,
            process_name,
            test_config: false,
        }
    }

    pub fn parse_clap(&mut self, args: &ArgMatches) -> anyhow::Result<()> {
        if let Some(verbose_level) = args.get_one::<u8>(ARGS_VERBOSE) {
            self.verbose_level = *verbose_level;
        }
        if args.get_flag(ARGS_TEST_CONFIG) {
            self.test_config = true;
        }
        Ok(())
    }
}

impl DaemonArgsExt for Command {
    fn append_daemon_args(self) -> Self {
        self.arg(
            Arg::new(ARGS_VERBOSE)
                .help("Show verbose output")
                .num_args(0)
                .action(ArgAction::Count)
                .short('v')
                .long(ARGS_VERBOSE),
        )
        .arg(
            Arg::new(ARGS_TEST_CONFIG)
                .help("Test the format of config file and exit")
                .action(ArgAction::SetTrue)
                .short('t')
                .long(ARGS_TEST_CONFIG),
        )
    }
}
