use actix_web::{HttpResponse, Responder};

/// Placeholder application responder; irrelevant to the hand-off core.
pub async fn hello() -> impl Responder {
    HttpResponse::Ok().body("hello world")
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{App, test, web};

    #[actix_web::test]
    async fn hello_responds_with_a_success_body() {
        let app =
            test::init_service(App::new().service(web::resource("/").to(hello))).await;

        let request = test::TestRequest::get().uri("/").to_request();
        let body = test::call_and_read_body(&app, request).await;

        assert_eq!(body, "hello world");
    }
}
