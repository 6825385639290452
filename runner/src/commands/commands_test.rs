use super::*;
use std::fs;
use tempfile::TempDir;

fn plan_args(workers: i64, dims: Option<u8>) -> PlanArgs {
    PlanArgs {
        workers,
        dims,
        ratio: None,
        method: None,
    }
}

#[test]
pub fn cli_parses_run() {
    let cli = Cli::try_parse_from([
        "foamrun", "--case", "cases/flame", "run", "chemFoam", "-n", "resume", "--show", "--",
        "-noFunctionObjects",
    ])
    .unwrap();

    assert_eq!(cli.case, PathBuf::from("cases/flame"));
    match cli.command {
        Commands::Run(args) => {
            assert_eq!(args.program, "chemFoam");
            assert_eq!(args.workers, Launch::Resume);
            assert!(args.show);
            assert_eq!(args.args, vec!["-noFunctionObjects"]);
        }
        other => panic!("unexpected command {other:?}"),
    }

    assert!(Cli::try_parse_from(["foamrun", "run", "chemFoam", "-n", "none"]).is_err());
}

#[test]
pub fn cli_overrides_config() {
    let mut config = CaseConfig::default();
    config.decomposition.method = "scotch".into();

    let decomposition = plan_from(&config, &plan_args(12, Some(3))).unwrap();
    assert_eq!(decomposition.shape.components(), vec![2, 2, 3]);
    assert_eq!(decomposition.method, "scotch");

    let decomposition = plan_from(&config, &plan_args(12, None)).unwrap();
    assert_eq!(decomposition.shape.components(), vec![3, 4]);

    assert!(matches!(
        plan_from(&config, &plan_args(12, Some(4))),
        Err(RunnerError::Decompose(DecomposeError::InvalidDimensions(4)))
    ));
}

#[test]
pub fn decompose_writes_dictionary() {
    let case = TempDir::new().unwrap();
    fs::create_dir(case.path().join("system")).unwrap();
    fs::write(
        case.path().join("system/decomposeParDict.org"),
        "numberOfSubdomains NUMPROCS;\nmethod DECOMPOSEPAR_METHOD;\nn (VALUE1 VALUE2 1);\n",
    )
    .unwrap();

    run(Cli::try_parse_from([
        "foamrun",
        "--case",
        case.path().to_str().unwrap(),
        "decompose",
        "6",
    ])
    .unwrap())
    .unwrap();

    assert_eq!(
        fs::read_to_string(case.path().join("system/decomposeParDict")).unwrap(),
        "numberOfSubdomains 6;\nmethod simple;\nn (2 3 1);\n"
    );
}

#[test]
pub fn parallel_run_prepares_dictionaries() {
    let case = TempDir::new().unwrap();
    fs::create_dir(case.path().join("system")).unwrap();
    fs::write(case.path().join("system/decomposeParDict.org"), "NUMPROCS VALUE1 VALUE2").unwrap();
    fs::write(case.path().join("system/balanceParDict.org"), "NUMPROCS").unwrap();

    let mut config = CaseConfig::default();
    // `echo` stands in for the MPI launcher
    config
        .executor
        .parameter
        .insert("launcher".into(), serde_yaml::Value::from("echo"));

    let args = RunArgs {
        program: "chemFoam".into(),
        workers: Launch::Workers(4),
        show: false,
        log: None,
        decompose: true,
        args: Vec::new(),
    };

    run_program(case.path(), &config, args).unwrap();

    assert_eq!(
        fs::read_to_string(case.path().join("system/decomposeParDict")).unwrap(),
        "4 2 2"
    );
    assert_eq!(
        fs::read_to_string(case.path().join("system/balanceParDict")).unwrap(),
        "4"
    );
    assert_eq!(
        fs::read_to_string(case.path().join("log.chemFoam")).unwrap(),
        "-np 4 chemFoam -parallel\n"
    );
}

#[test]
pub fn failed_run_is_an_error() {
    let case = TempDir::new().unwrap();
    let args = RunArgs {
        program: "false".into(),
        workers: Launch::default(),
        show: false,
        log: None,
        decompose: false,
        args: Vec::new(),
    };

    assert!(matches!(
        run_program(case.path(), &CaseConfig::default(), args),
        Err(RunnerError::Executor(ExecutorError::Failed { .. }))
    ));
}
