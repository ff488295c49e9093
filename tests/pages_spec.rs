use axum::http::StatusCode;
use axum_test::TestServer;
use speculate2::speculate;
use todo_pipe::api::create_router;
use todo_pipe::models::CreateTodoInput;
use todo_pipe::Database;

fn database() -> Database {
    let db = Database::open_in_memory().expect("in-memory database");
    db.migrate().expect("schema");
    db
}

fn server(db: &Database) -> TestServer {
    TestServer::new(create_router(db.clone())).expect("test server")
}

fn seed(db: &Database, text: &str) -> todo_pipe::models::TodoItem {
    db.create_todo(CreateTodoInput {
        text: text.to_string(),
        done: false,
    })
    .expect("seed item")
}

speculate! {
    use tokio_test::block_on;

    describe "todo pages" {
        describe "listing" {
            it "shows every item newest first" {
                block_on(async {
                    let db = database();
                    seed(&db, "older");
                    seed(&db, "newer");

                    let response = server(&db).get("/").await;
                    response.assert_status_ok();
                    let page = response.text();
                    let newer = page.find("newer").expect("newer listed");
                    let older = page.find("older").expect("older listed");
                    assert!(newer < older);
                    assert!(page.contains(r#"id="todo-data""#));
                });
            }

            it "reports an empty list" {
                block_on(async {
                    let db = database();
                    let page = server(&db).get("/").await.text();
                    assert!(page.contains("Nothing to do."));
                });
            }
        }

        describe "creating" {
            it "redirects to the new item" {
                block_on(async {
                    let db = database();
                    let response = server(&db)
                        .post("/todos/new")
                        .form(&[("text", "buy milk"), ("done", "on")])
                        .await;

                    response.assert_status(StatusCode::SEE_OTHER);
                    let items = db.list_todos().unwrap();
                    assert_eq!(items.len(), 1);
                    assert!(items[0].done);
                    assert_eq!(response.header("location"), items[0].url().as_str());
                });
            }

            it "re-renders the form with errors when text is blank" {
                block_on(async {
                    let db = database();
                    let response = server(&db)
                        .post("/todos/new")
                        .form(&[("text", "   ")])
                        .await;

                    response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
                    assert!(response.text().contains("This field is required."));
                    assert_eq!(db.count_todos().unwrap(), 0);
                });
            }

            it "serves an empty form" {
                block_on(async {
                    let db = database();
                    let response = server(&db).get("/todos/new").await;
                    response.assert_status_ok();
                    assert!(response.text().contains(r#"action="/todos/new""#));
                });
            }
        }

        describe "reading" {
            it "shows a single item" {
                block_on(async {
                    let db = database();
                    let item = seed(&db, "<b>bold</b>");
                    let response = server(&db).get(&item.url()).await;
                    response.assert_status_ok();
                    assert!(response.text().contains("&lt;b&gt;bold&lt;/b&gt;"));
                });
            }

            it "answers not found for a missing item" {
                block_on(async {
                    let db = database();
                    let response = server(&db)
                        .get(&format!("/todos/{}", uuid::Uuid::new_v4()))
                        .await;
                    response.assert_status(StatusCode::NOT_FOUND);
                });
            }

            it "answers not found for a malformed id" {
                block_on(async {
                    let db = database();
                    let server = server(&db);
                    for path in ["/todos/not-an-id", "/todos/not-an-id/edit", "/todos/not-an-id/delete"] {
                        server.get(path).await.assert_status(StatusCode::NOT_FOUND);
                    }
                    server
                        .post("/todos/not-an-id/delete")
                        .await
                        .assert_status(StatusCode::NOT_FOUND);
                    server
                        .post("/todos/not-an-id/edit")
                        .form(&[("text", "anything")])
                        .await
                        .assert_status(StatusCode::NOT_FOUND);
                });
            }
        }

        describe "updating" {
            it "pre-fills the edit form" {
                block_on(async {
                    let db = database();
                    let item = seed(&db, "draft");
                    let response = server(&db).get(&item.edit_url()).await;
                    response.assert_status_ok();
                    assert!(response.text().contains(">draft</textarea>"));
                });
            }

            it "saves a resubmitted form" {
                block_on(async {
                    let db = database();
                    let item = seed(&db, "draft");
                    let response = server(&db)
                        .post(&item.edit_url())
                        .form(&[("text", "final"), ("done", "on")])
                        .await;

                    response.assert_status(StatusCode::SEE_OTHER);
                    let stored = db.get_todo(item.id).unwrap().unwrap();
                    assert_eq!(stored.text, "final");
                    assert!(stored.done);
                    assert_eq!(stored.created_at, item.created_at);
                });
            }

            it "unticks done when the checkbox is absent" {
                block_on(async {
                    let db = database();
                    let item = db
                        .create_todo(CreateTodoInput { text: "x".into(), done: true })
                        .unwrap();
                    server(&db)
                        .post(&item.edit_url())
                        .form(&[("text", "x")])
                        .await
                        .assert_status(StatusCode::SEE_OTHER);
                    assert!(!db.get_todo(item.id).unwrap().unwrap().done);
                });
            }

            it "answers not found for a missing item" {
                block_on(async {
                    let db = database();
                    let response = server(&db)
                        .post(&format!("/todos/{}/edit", uuid::Uuid::new_v4()))
                        .form(&[("text", "x")])
                        .await;
                    response.assert_status(StatusCode::NOT_FOUND);
                });
            }
        }

        describe "deleting" {
            it "asks for confirmation first" {
                block_on(async {
                    let db = database();
                    let item = seed(&db, "doomed");
                    let response = server(&db).get(&item.delete_url()).await;
                    response.assert_status_ok();
                    assert!(response.text().contains(r#"Delete "doomed"?"#));
                    assert_eq!(db.count_todos().unwrap(), 1);
                });
            }

            it "removes the item and returns to the list" {
                block_on(async {
                    let db = database();
                    let item = seed(&db, "doomed");
                    let response = server(&db).post(&item.delete_url()).await;
                    response.assert_status(StatusCode::SEE_OTHER);
                    assert_eq!(response.header("location"), "/");
                    assert!(db.get_todo(item.id).unwrap().is_none());
                });
            }

            it "answers not found twice over" {
                block_on(async {
                    let db = database();
                    let item = seed(&db, "doomed");
                    let server = server(&db);
                    server.post(&item.delete_url()).await;
                    server
                        .post(&item.delete_url())
                        .await
                        .assert_status(StatusCode::NOT_FOUND);
                });
            }
        }

        it "reports health" {
            block_on(async {
                let db = database();
                let body: serde_json::Value = server(&db).get("/health").await.json();
                assert_eq!(body["status"], "ok");
            });
        }
    }
}
