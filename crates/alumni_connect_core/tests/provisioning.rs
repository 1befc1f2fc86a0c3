mod common;

use alumni_connect_core::{
    ExternalIdentity, IdentityStore, Role, RoleData, StudentData, WorkflowError,
};
use common::*;

#[tokio::test]
async fn signup_creates_account_and_single_profile() {
    let h = harness();
    let session = h
        .provisioner
        .provision_account(signup("asha", RoleData::Student(student_data())))
        .await
        .expect("signup succeeds");

    assert_eq!(session.token, format!("token:{}", session.account.id));
    assert_eq!(session.account.role, Some(Role::Student));
    assert_eq!(session.account.email, "asha@example.com");
    assert!(h.store.has_student_profile(session.account.id).await.unwrap());
    assert!(!h.store.has_alumni_profile(session.account.id).await.unwrap());

    let stored = h
        .store
        .find_credentials_by_email("asha@example.com")
        .await
        .unwrap()
        .expect("credentials stored");
    assert_eq!(stored.password_hash.as_deref(), Some("plain$correct horse"));
}

#[tokio::test]
async fn out_of_range_cgpa_creates_nothing() {
    let h = harness();
    let data = RoleData::Student(StudentData {
        cgpa: 11.0,
        ..student_data()
    });

    match h.provisioner.provision_account(signup("asha", data)).await {
        Err(WorkflowError::InvalidRoleData(_)) => {}
        other => panic!("expected invalid role data, got {other:?}"),
    }
    assert_eq!(h.store.account_count(), 0);
}

#[tokio::test]
async fn duplicate_email_is_rejected_even_with_another_username() {
    let h = harness();
    h.alumni("vikram").await;

    let mut second = signup("vikram", RoleData::Alumni(alumni_data()));
    second.username = "vikram-again".to_string();
    second.email = " Vikram@Example.com ".to_string();

    match h.provisioner.provision_account(second).await {
        Err(WorkflowError::DuplicateAccount) => {}
        other => panic!("expected duplicate account, got {other:?}"),
    }
    assert_eq!(h.store.account_count(), 1);
}

#[tokio::test]
async fn failed_profile_write_rolls_back_the_account() {
    let h = harness();
    h.store.inject_profile_write_failure(true);

    for (name, data) in [
        ("asha", RoleData::Student(student_data())),
        ("vikram", RoleData::Alumni(alumni_data())),
    ] {
        match h.provisioner.provision_account(signup(name, data)).await {
            Err(WorkflowError::StorageUnavailable) => {}
            other => panic!("expected storage failure, got {other:?}"),
        }
    }
    assert_eq!(h.store.account_count(), 0);
    assert!(h
        .store
        .find_credentials_by_email("asha@example.com")
        .await
        .unwrap()
        .is_none());

    // The same email is free once the fault clears.
    h.store.inject_profile_write_failure(false);
    h.student("asha").await;
    assert_eq!(h.store.account_count(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_signups_with_one_email_yield_one_account() {
    let h = harness();
    let attempts = (0..8).map(|i| {
        let provisioner = h.provisioner.clone();
        let mut request = signup("asha", RoleData::Student(student_data()));
        request.username = format!("asha-{i}");
        tokio::spawn(async move { provisioner.provision_account(request).await })
    });

    let results = futures::future::join_all(attempts).await;
    let created = results
        .iter()
        .filter(|r| matches!(r, Ok(Ok(_))))
        .count();
    let duplicates = results
        .iter()
        .filter(|r| matches!(r, Ok(Err(WorkflowError::DuplicateAccount))))
        .count();
    assert_eq!(created, 1);
    assert_eq!(duplicates, 7);
    assert_eq!(h.store.account_count(), 1);
}

#[tokio::test]
async fn sign_in_checks_the_password() {
    let h = harness();
    let id = h.student("asha").await;

    let session = h
        .provisioner
        .sign_in("ASHA@example.com", "correct horse")
        .await
        .expect("valid credentials");
    assert_eq!(session.account.id, id);
    assert_eq!(h.provisioner.authenticate(&session.token).unwrap(), id);

    for (email, password) in [
        ("asha@example.com", "wrong"),
        ("nobody@example.com", "correct horse"),
        ("not-an-email", "correct horse"),
    ] {
        match h.provisioner.sign_in(email, password).await {
            Err(WorkflowError::InvalidCredentials) => {}
            other => panic!("expected invalid credentials, got {other:?}"),
        }
    }
}

#[tokio::test]
async fn external_identity_maps_to_one_passwordless_account() {
    let h = harness();
    let identity = ExternalIdentity {
        email: "Meera@Example.com".to_string(),
        display_name: "Meera Iyer".to_string(),
    };

    let first = h
        .provisioner
        .provision_external(identity.clone())
        .await
        .expect("first external sign-in");
    let second = h
        .provisioner
        .provision_external(identity)
        .await
        .expect("second external sign-in");

    assert_eq!(first.account.id, second.account.id);
    assert_eq!(first.account.role, None);
    assert_eq!(first.account.username, "Meera Iyer");
    assert_eq!(h.store.account_count(), 1);

    // No local password can ever match.
    match h.provisioner.sign_in("meera@example.com", "").await {
        Err(WorkflowError::InvalidCredentials) => {}
        other => panic!("expected invalid credentials, got {other:?}"),
    }
}

#[tokio::test]
async fn provider_tokens_are_verified_before_sign_in() {
    let h = harness();

    let session = h
        .provisioner
        .sign_in_external(&StubVerifier, " ok:Meera@Example.com ")
        .await
        .expect("verified token");
    assert_eq!(session.account.email, "meera@example.com");
    // No display name from the provider: the email stands in.
    assert_eq!(session.account.username, "meera@example.com");

    for token in ["revoked", "", "   "] {
        match h.provisioner.sign_in_external(&StubVerifier, token).await {
            Err(WorkflowError::InvalidCredentials) => {}
            other => panic!("expected invalid credentials, got {other:?}"),
        }
    }
    match h.provisioner.sign_in_external(&StubVerifier, "slow").await {
        Err(WorkflowError::UpstreamUnavailable) => {}
        other => panic!("expected upstream unavailable, got {other:?}"),
    }
    assert_eq!(h.store.account_count(), 1);
}

#[tokio::test]
async fn external_account_completes_its_profile_once() {
    let h = harness();
    let session = h
        .provisioner
        .provision_external(ExternalIdentity {
            email: "meera@example.com".to_string(),
            display_name: "Meera Iyer".to_string(),
        })
        .await
        .unwrap();
    let id = session.account.id;

    let account = h
        .provisioner
        .complete_profile(id, RoleData::Alumni(alumni_data()))
        .await
        .expect("profile completed");
    assert_eq!(account.role, Some(Role::Alumni));
    assert!(h.store.has_alumni_profile(id).await.unwrap());

    match h
        .provisioner
        .complete_profile(id, RoleData::Student(student_data()))
        .await
    {
        Err(WorkflowError::ProfileExists) => {}
        other => panic!("expected profile exists, got {other:?}"),
    }
    assert!(!h.store.has_student_profile(id).await.unwrap());
}

#[tokio::test]
async fn signed_up_accounts_cannot_attach_a_second_profile() {
    let h = harness();
    let id = h.student("asha").await;

    match h
        .provisioner
        .complete_profile(id, RoleData::Alumni(alumni_data()))
        .await
    {
        Err(WorkflowError::ProfileExists) => {}
        other => panic!("expected profile exists, got {other:?}"),
    }
    assert!(!h.store.has_alumni_profile(id).await.unwrap());
}

#[tokio::test]
async fn unknown_tokens_are_rejected() {
    let h = harness();
    assert!(matches!(
        h.provisioner.authenticate("garbage"),
        Err(WorkflowError::InvalidCredentials)
    ));
}
