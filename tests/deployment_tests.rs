use anyhow::Result;
use deckhand::domain::{DeployError, StepOutcome, Topology};
use deckhand::infra::config::AppConfig;
use deckhand::test_support::FakeRunner;
use deckhand::{DeploySettings, LifecycleManager};
use std::path::{Path, PathBuf};
use std::sync::Arc;

fn settings(project_dir: &Path) -> Result<DeploySettings> {
    AppConfig::default().resolve(project_dir)
}

fn manager_with(fake: &Arc<FakeRunner>, project_dir: &Path) -> Result<LifecycleManager> {
    Ok(LifecycleManager::new(fake.clone(), settings(project_dir)?))
}

#[test]
fn test_restart_service_only_stops_before_starting() -> Result<()> {
    let fake = Arc::new(FakeRunner::new());
    let manager = manager_with(&fake, Path::new("/srv/study"))?;

    let report = manager.restart(Topology::ServiceOnly);

    assert!(report.succeeded());
    assert_eq!(
        fake.commands(),
        vec![
            "docker compose -f docker-compose.study-only.yml down",
            "docker compose -f docker-compose.study-only.yml up -d",
        ]
    );
    for call in fake.calls() {
        assert_eq!(call.working_dir, PathBuf::from("/srv/study"));
    }
    Ok(())
}

#[test]
fn test_rebuild_aborts_before_start_when_image_build_fails() -> Result<()> {
    let fake = Arc::new(FakeRunner::new());
    fake.respond_with(
        "docker build",
        1,
        "failed to solve: failed to read dockerfile",
    );
    let manager = manager_with(&fake, Path::new("/srv/study"))?;

    let report = manager.rebuild(Topology::ServiceOnly);

    assert!(!report.succeeded());
    assert_eq!(
        report.outcome_of("build image"),
        Some(StepOutcome::CriticalFailed)
    );
    assert!(!fake.issued("docker compose -f docker-compose.study-only.yml up"));

    match &report.error {
        Some(err @ DeployError::CommandFailed { exit_code, .. }) => {
            assert_eq!(*exit_code, 1);
            assert_eq!(err.output(), Some("failed to solve: failed to read dockerfile"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
    Ok(())
}

#[test]
fn test_rebuild_orders_cleanup_before_build() -> Result<()> {
    let fake = Arc::new(FakeRunner::new());
    let manager = manager_with(&fake, Path::new("/srv/study"))?;

    assert!(manager.rebuild(Topology::ServiceOnly).succeeded());

    let down = fake.position("docker compose -f docker-compose.study-only.yml down");
    let rmi = fake.position("docker rmi asyncsite/study-service:latest -f");
    let build = fake.position("docker build -t asyncsite/study-service:latest .");
    let up = fake.position("docker compose -f docker-compose.study-only.yml up -d");

    assert!(down < rmi && rmi < build && build < up, "{:?}", fake.commands());
    assert!(down.is_some());
    Ok(())
}

#[test]
fn test_standalone_run_replaces_container_with_verbatim_env() -> Result<()> {
    let fake = Arc::new(FakeRunner::new());
    fake.fail_on("docker stop", 1);
    fake.fail_on("docker rm", 1);
    let manager = manager_with(&fake, Path::new("/srv/study"))?;

    let report = manager.run_standalone(false);

    assert!(report.succeeded());
    assert_eq!(
        report.step_labels(),
        vec!["stop container", "remove container", "run container"]
    );
    assert_eq!(
        report.outcome_of("stop container"),
        Some(StepOutcome::BestEffortFailed)
    );

    let calls = fake.calls();
    let run = &calls[2].argv;
    assert_eq!(
        run[1..].to_vec(),
        vec![
            "run",
            "-d",
            "--name",
            "asyncsite-study-service",
            "--network",
            "asyncsite-network",
            "-p",
            "8083:8083",
            "-e",
            "SPRING_PROFILES_ACTIVE=docker",
            "-e",
            "EUREKA_CLIENT_SERVICE_URL_DEFAULTZONE=http://asyncsite-eureka:8761/eureka/",
            "-e",
            "SPRING_DATASOURCE_URL=jdbc:mysql://asyncsite-mysql:3306/studydb?useSSL=false&serverTimezone=UTC&allowPublicKeyRetrieval=true",
            "-e",
            "SPRING_DATASOURCE_USERNAME=root",
            "-e",
            "SPRING_DATASOURCE_PASSWORD=asyncsite_root_2024!",
            "asyncsite/study-service:latest",
        ]
    );
    assert!(report.hints.contains(&"Access at: http://localhost:8083".to_string()));
    Ok(())
}

#[test]
fn test_infra_only_with_missing_directory_spawns_nothing() -> Result<()> {
    let project = tempfile::tempdir()?;
    let fake = Arc::new(FakeRunner::new());
    let manager = manager_with(&fake, project.path())?;

    let report = manager.infra_only();

    assert!(!report.succeeded());
    assert!(matches!(
        report.error,
        Some(DeployError::PreconditionMissing { .. })
    ));
    assert!(fake.calls().is_empty());
    Ok(())
}

#[test]
fn test_infra_only_runs_in_sibling_directory() -> Result<()> {
    let root = tempfile::tempdir()?;
    let project = root.path().join("study-service");
    let platform = root.path().join("core-platform");
    std::fs::create_dir_all(&project)?;
    std::fs::create_dir_all(&platform)?;

    let fake = Arc::new(FakeRunner::new());
    let manager = manager_with(&fake, &project)?;

    let report = manager.infra_only();

    assert!(report.succeeded());
    assert_eq!(
        fake.commands(),
        vec!["docker compose up -d mysql redis eureka-server"]
    );
    assert_eq!(
        fake.calls()[0].working_dir.canonicalize()?,
        platform.canonicalize()?
    );
    assert!(report.hints.iter().any(|h| h == "Redis: localhost:6379"));
    Ok(())
}

#[test]
fn test_every_operation_fails_cleanly_without_runtime() -> Result<()> {
    let root = tempfile::tempdir()?;
    let project = root.path().join("study-service");
    std::fs::create_dir_all(&project)?;
    std::fs::create_dir_all(root.path().join("core-platform"))?;

    let fake = Arc::new(FakeRunner::without_runtime());
    let manager = manager_with(&fake, &project)?;

    let reports = vec![
        manager.start(Topology::FullStack),
        manager.start(Topology::ServiceOnly),
        manager.stop(Topology::FullStack),
        manager.stop(Topology::Standalone),
        manager.restart(Topology::ServiceOnly),
        manager.build_image(),
        manager.build_and_run(Topology::FullStack),
        manager.rebuild(Topology::ServiceOnly),
        manager.rebuild(Topology::Standalone),
        manager.run_standalone(true),
        manager.logs(),
        manager.status(),
        manager.infra_only(),
    ];

    for report in reports {
        assert!(
            matches!(report.error, Some(DeployError::RuntimeUnavailable)),
            "{} did not report a missing runtime",
            report.operation
        );
    }
    assert!(fake.calls().is_empty(), "{:?}", fake.commands());
    Ok(())
}

#[test]
fn test_status_with_stopped_daemon_still_succeeds() -> Result<()> {
    let fake = Arc::new(FakeRunner::new());
    fake.respond_with(
        "docker ps",
        1,
        "Cannot connect to the Docker daemon at unix:///var/run/docker.sock",
    );
    let manager = manager_with(&fake, Path::new("/srv/study"))?;

    let report = manager.status();

    assert!(report.succeeded());
    assert!(report.output.unwrap_or_default().contains("Cannot connect"));
    Ok(())
}
