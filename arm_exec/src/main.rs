//! # Arm Control Executable
//!
//! This executable is responsible for controlling the arm:
//! - Telecommands are taken from a script or from the interactive prompt
//! - Each telecommand is applied to arm control, which gives the actuator demands
//! - Demands are written to the actuator sink, either simulated servos or a PCA9685 board
//! - The resulting pose is archived after every telecommand

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

// External
use color_eyre::{
    eyre::{eyre, WrapErr},
    Result,
};
use log::{debug, info, warn};
use regex::Regex;
use rustyline::{error::ReadlineError, DefaultEditor};
use serde::Serialize;
use std::{
    fmt::Write as _,
    path::{Path, PathBuf},
    thread,
    time::Duration,
};
use structopt::StructOpt;

// Internal
use arm_lib::{
    arm_ctrl::{self, ArmCtrl},
    cmd_processor::CmdProcessor,
    data_store::DataStore,
    params::{ArmExecParams, SinkKind},
    servo_ctrl::{ActuatorSink, SimServo},
};
use comms_if::{
    eqpt::mech::{GripperState, JointId, ROT_JOINT_IDS},
    tc::{
        arm_ctrl::{ArmCmd, JointTarget},
        Tc, TcResponse,
    },
};
use util::{
    archive::Archiver,
    host,
    logger::{logger_init, LevelFilter},
    script_interpreter::{PendingTcs, ScriptInterpreter},
    session::{self, Session},
};

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

const PROMPT: &str = "arm $ ";

const HISTORY_FILE: &str = "history.txt";

/// Free text naming a rotational joint and then an angle, e.g. "move base to -45 degrees".
const FREE_TEXT_ANGLE_PATTERN: &str = r"(?i)\b(base|shoulder|elbow|wrist)\b\D*?(-?\d+)";

/// Free text opening or closing the gripper, in either word order.
const FREE_TEXT_GRIPPER_PATTERN: &str =
    r"(?i)\b(open|close|closed)\b.*\bgripper\b|\bgripper\b.*\b(open|close|closed)\b";

/// Time between checks for pending script TCs.
const SCRIPT_POLL_PERIOD: Duration = Duration::from_millis(10);

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

#[derive(StructOpt, Debug)]
#[structopt(name = "arm_exec", about = "Controls a 4 DOF robotic arm with a gripper")]
struct Opt {
    /// Run the telecommands in this script instead of the interactive prompt
    #[structopt(short, long, parse(from_os_str))]
    script: Option<PathBuf>,

    /// Name of the executable parameter file in the params directory
    #[structopt(short, long, default_value = "arm_exec.toml")]
    params: String,

    /// Also log debug and trace messages
    #[structopt(short, long)]
    verbose: bool,
}

/// Commands accepted by the interactive prompt, besides command names and JSON requests.
#[derive(StructOpt, Debug, PartialEq)]
#[structopt(name = "arm", global_setting = structopt::clap::AppSettings::AllowNegativeNumbers)]
enum PromptCmd {
    /// Print the arm telemetry
    Status,

    /// Move a rotational joint to an absolute angle
    Goto { joint: String, deg: i32 },

    /// Open or close the gripper
    Gripper { state: String },

    /// Return every joint to neutral and open the gripper
    Stop,

    /// Exit the prompt
    Quit,
}

/// A row of the pose archive.
#[derive(Serialize)]
struct PoseRecord {
    time_s: f64,
    base_deg: i32,
    shoulder_deg: i32,
    elbow_deg: i32,
    wrist_deg: i32,
    gripper: GripperState,
    response: String,
}

/// Everything a processed telecommand touches.
struct Exec {
    ds: DataStore,
    processor: CmdProcessor,
    sink: Box<dyn ActuatorSink>,
    archiver: Archiver,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

enum LineOutcome {
    Continue,
    Quit,
}

// ------------------------------------------------------------------------------------------------
// MAIN
// ------------------------------------------------------------------------------------------------

fn main() -> Result<()> {
    color_eyre::install()?;

    let opt = Opt::from_args();

    // ---- EARLY INITIALISATION ----

    // Initialise session
    let session = Session::new("arm_exec", "sessions").wrap_err("Failed to create the session")?;

    // Initialise logger
    let level = match opt.verbose {
        true => LevelFilter::Trace,
        false => LevelFilter::Info,
    };
    logger_init(level, &session).wrap_err("Failed to initialise logging")?;

    // Log information on this execution.
    info!("Arm Control Executable\n");
    info!(
        "Software root: {:?}",
        host::get_sw_root().wrap_err("Failed to get the software root")?
    );
    info!("Session directory: {:?}\n", session.session_root);

    info!("Initialising...");

    // ---- LOAD PARAMETERS ----

    let params: ArmExecParams = util::params::load(&opt.params)
        .wrap_err_with(|| format!("Could not load exec params from {}", opt.params))?;

    let arm_ctrl_params: arm_ctrl::Params = util::params::load(&params.arm_ctrl_params)
        .wrap_err("Could not load ArmCtrl params")?;

    info!("Parameters loaded");

    // ---- INITIALISE MODULES ----

    let arm_ctrl = ArmCtrl::new(arm_ctrl_params).wrap_err("Failed to initialise ArmCtrl")?;
    info!("ArmCtrl init complete");

    let sink = build_sink(&params).wrap_err("Failed to initialise the actuator sink")?;
    info!("{:?} actuator sink initialised", params.sink);

    let archiver = Archiver::from_path(&session, &params.archive_name)
        .wrap_err("Failed to create the pose archive")?;

    let mut exec = Exec {
        ds: DataStore::new(arm_ctrl, params.max_sink_errors),
        processor: CmdProcessor::new(params.step_delay(), params.stop_delay()),
        sink,
        archiver,
    };

    // Put the actuators where arm control thinks they are
    let dems = exec.ds.arm_ctrl.dems();
    match exec.sink.write_all(&dems) {
        Ok(()) => exec.ds.sink_result(true),
        Err(e) => {
            warn!("Could not move the arm to its initial pose: {}", e);
            exec.ds.sink_result(false);
        }
    }

    info!("Initialisation complete\n");

    // ---- MAIN LOOP ----

    match opt.script {
        Some(ref path) => run_script(&mut exec, path)?,
        None => run_prompt(&mut exec, &session)?,
    }

    info!(
        "{} commands applied, final pose: {:?}",
        exec.ds.num_cmds,
        exec.ds.arm_ctrl.snapshot()
    );

    Ok(())
}

// ------------------------------------------------------------------------------------------------
// FUNCTIONS
// ------------------------------------------------------------------------------------------------

fn build_sink(params: &ArmExecParams) -> Result<Box<dyn ActuatorSink>> {
    match params.sink {
        SinkKind::Sim => Ok(Box::new(SimServo::new())),
        SinkKind::Pca9685 => build_pca9685_sink(params),
    }
}

#[cfg(target_arch = "arm")]
fn build_pca9685_sink(params: &ArmExecParams) -> Result<Box<dyn ActuatorSink>> {
    use arm_lib::servo_ctrl::{pca9685, ServoCtrl};

    let i2c = rppal::i2c::I2c::new().wrap_err("Failed to open the I2C bus")?;

    let board = pca9685::init_board(i2c, params.pca9685.i2c_address, params.pca9685.prescale)
        .wrap_err("Failed to initialise the PCA9685 board")?;

    let ctrl = ServoCtrl::new(board, &params.pca9685.servos)
        .wrap_err("Invalid servo configuration")?;

    Ok(Box::new(ctrl))
}

#[cfg(not(target_arch = "arm"))]
fn build_pca9685_sink(_params: &ArmExecParams) -> Result<Box<dyn ActuatorSink>> {
    Err(eyre!(
        "The PCA9685 sink needs the Raspberry Pi I2C bus, use the Sim sink on this host"
    ))
}

/// Read a plain sentence such as "move base to 45 degrees" or "close the gripper" as a target.
///
/// Returns `None` if the sentence names no motion. Angles are not range checked here, that is
/// left to target planning.
fn parse_free_text(line: &str) -> Option<JointTarget> {
    let lower = line.to_lowercase();

    if lower.split(|c: char| !c.is_alphanumeric()).any(|w| w == "stop") {
        return Some(JointTarget::EmergencyStop);
    }

    if let Some(caps) = Regex::new(FREE_TEXT_GRIPPER_PATTERN).ok()?.captures(&lower) {
        let word = caps.get(1).or_else(|| caps.get(2))?.as_str();
        return Some(JointTarget::Gripper(match word {
            "open" => GripperState::Open,
            _ => GripperState::Closed,
        }));
    }

    let caps = Regex::new(FREE_TEXT_ANGLE_PATTERN).ok()?.captures(&lower)?;
    let joint = JointId::from_name(caps.get(1)?.as_str())?;
    let deg = caps.get(2)?.as_str().parse().ok()?;

    Some(JointTarget::Angle { joint, deg })
}

/// Prompt usage, with the range each rotational joint accepts.
fn help_text(arm_ctrl: &ArmCtrl) -> String {
    let mut text = String::from("Joints:\n");

    for id in ROT_JOINT_IDS.iter() {
        if let Some((min, max)) = arm_ctrl.joint(*id).map(|j| j.limits_deg()) {
            writeln!(text, "    {:<10} {} to {} degrees", id.name(), min, max).ok();
        }
    }

    writeln!(text, "    {:<10} open or closed", JointId::Gripper.name()).ok();
    text.push_str("Commands:\n");

    for cmd in ArmCmd::ALL.iter() {
        writeln!(text, "    {}", cmd).ok();
    }

    text.push_str(
        "Prompt:\n    status | goto <joint> <deg> | gripper <open|closed> | stop | help | quit\n",
    );
    text.push_str("Sentences such as \"move base to 45 degrees\" or \"close gripper\" also work\n");

    text
}

/// Execute the TCs in a script as they fall due.
fn run_script(exec: &mut Exec, path: &Path) -> Result<()> {
    info!("Loading script from {:?}", path);

    let mut si = ScriptInterpreter::new(path).wrap_err("Failed to load script")?;

    info!(
        "Loaded script lasts {:.02} s and contains {} TCs\n",
        si.get_duration(),
        si.get_num_tcs()
    );

    loop {
        match si.get_pending_tcs() {
            PendingTcs::None => thread::sleep(SCRIPT_POLL_PERIOD),
            PendingTcs::Some(tc_vec) => {
                for tc in tc_vec.iter() {
                    let rsp = exec.tc(tc);
                    info!("{:?}: {}", tc, rsp.status());
                }
            }
            // Exit if end of script reached
            PendingTcs::EndOfScript => {
                info!("End of TC script reached, stopping");
                break;
            }
        }
    }

    Ok(())
}

/// Read TCs from the interactive prompt until the user quits.
fn run_prompt(exec: &mut Exec, session: &Session) -> Result<()> {
    let mut rl = DefaultEditor::new().wrap_err("Failed to start the prompt")?;
    let history_path = session.session_root.join(HISTORY_FILE);

    println!("Enter a command name (e.g. WAIST_LEFT), a JSON request, or one of:");
    println!("    status | goto <joint> <deg> | gripper <open|closed> | stop | help | quit");

    loop {
        match rl.readline(PROMPT) {
            Ok(line) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }

                rl.add_history_entry(line).ok();

                if let LineOutcome::Quit = exec.line(line) {
                    break;
                }
            }
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
            Err(e) => return Err(e).wrap_err("Error reading from the prompt"),
        }
    }

    if let Err(e) = rl.save_history(&history_path) {
        warn!("Could not save the prompt history: {}", e);
    }

    Ok(())
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Exec {
    /// Execute a TC and archive the resulting pose.
    fn tc(&mut self, tc: &Tc) -> TcResponse {
        let rsp = self.processor.exec(&mut self.ds, self.sink.as_mut(), tc);
        self.archive(&rsp);
        rsp
    }

    /// Execute a JSON request and archive the resulting pose.
    fn json(&mut self, json_str: &str) -> TcResponse {
        let rsp = self.processor.exec_json(&mut self.ds, self.sink.as_mut(), json_str);
        self.archive(&rsp);
        rsp
    }

    /// Handle one line from the prompt.
    fn line(&mut self, line: &str) -> LineOutcome {
        // JSON requests and bare command names go straight through
        if line.starts_with('{') {
            println!("{}", self.json(line).to_json());
            return LineOutcome::Continue;
        }
        if let Ok(cmd) = line.parse::<ArmCmd>() {
            println!("{}", self.tc(&Tc::Arm(cmd)).to_json());
            return LineOutcome::Continue;
        }

        // Handled here rather than by structopt, which reserves `help` for its own usage text
        if line.eq_ignore_ascii_case("help") || line == "?" {
            print!("{}", help_text(&self.ds.arm_ctrl));
            return LineOutcome::Continue;
        }

        let cmd = match PromptCmd::from_iter_safe(
            std::iter::once("arm").chain(line.split_whitespace()),
        ) {
            Ok(c) => c,
            Err(e) => {
                // Fall back on plain sentences before giving up
                match parse_free_text(line) {
                    Some(target) => {
                        debug!("Free text {:?} read as {:?}", line, target);
                        println!("{}", self.tc(&Tc::Target(target)).to_json());
                    }
                    None => println!("{}", e.message),
                }
                return LineOutcome::Continue;
            }
        };

        debug!("Prompt command: {:?}", cmd);

        let target = match cmd {
            PromptCmd::Status => {
                match serde_json::to_string(&self.ds.telemetry()) {
                    Ok(s) => println!("{}", s),
                    Err(e) => warn!("Could not serialise telemetry: {}", e),
                }
                return LineOutcome::Continue;
            }
            PromptCmd::Quit => return LineOutcome::Quit,
            PromptCmd::Stop => JointTarget::EmergencyStop,
            PromptCmd::Goto { joint, deg } => match JointId::from_name(&joint) {
                Some(joint) => JointTarget::Angle { joint, deg },
                None => {
                    println!("{}", TcResponse::Rejected("Invalid joint".into()).to_json());
                    return LineOutcome::Continue;
                }
            },
            PromptCmd::Gripper { state } => match GripperState::from_label(&state) {
                Some(s) => JointTarget::Gripper(s),
                None => {
                    println!(
                        "{}",
                        TcResponse::Rejected(
                            "Invalid gripper state (must be 'open' or 'closed')".into()
                        )
                        .to_json()
                    );
                    return LineOutcome::Continue;
                }
            },
        };

        println!("{}", self.tc(&Tc::Target(target)).to_json());

        LineOutcome::Continue
    }

    fn archive(&mut self, rsp: &TcResponse) {
        let pose = self.ds.arm_ctrl.snapshot();

        let record = PoseRecord {
            time_s: session::get_elapsed_seconds(),
            base_deg: pose.base_deg,
            shoulder_deg: pose.shoulder_deg,
            elbow_deg: pose.elbow_deg,
            wrist_deg: pose.wrist_deg,
            gripper: pose.gripper,
            response: rsp.status(),
        };

        if let Err(e) = self.archiver.serialise(record) {
            warn!("Could not archive the arm pose: {}", e);
        }
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------
