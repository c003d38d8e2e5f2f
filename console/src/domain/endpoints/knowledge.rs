//! Knowledge-base endpoints: categories, questions, general questions and
//! files.

use super::models::{
    Category, CategoryList, ChatbotFile, FileContent, FileDownload, FileList, FileUpload,
    GeneralQuestion, NewCategory, Question, QuestionDraft, QuestionList, Upload,
};
use super::{ConsoleApi, api_path, chatbot_path};
use crate::domain::error::ApiError;
use crate::domain::request::{ApiRequest, MultipartForm};

impl ConsoleApi {
    /// Category tree of a chatbot, flattened.
    ///
    /// # Errors
    ///
    /// Returns the normalized call failure.
    pub async fn categories(&self, chatbot_id: u64) -> Result<Vec<Category>, ApiError> {
        let list: CategoryList = self
            .fetch(ApiRequest::get(chatbot_path(chatbot_id, "/categories")))
            .await?;
        Ok(list.categories)
    }

    /// Add a category.
    ///
    /// # Errors
    ///
    /// Returns the normalized call failure.
    pub async fn create_category(
        &self,
        chatbot_id: u64,
        category: &NewCategory,
    ) -> Result<(), ApiError> {
        let request =
            ApiRequest::post(chatbot_path(chatbot_id, "/categories")).with_json(category.to_json());
        self.send(request).await.map(drop)
    }

    /// Remove a category.
    ///
    /// # Errors
    ///
    /// Returns the normalized call failure.
    pub async fn delete_category(&self, chatbot_id: u64, category_id: u64) -> Result<(), ApiError> {
        let path = chatbot_path(chatbot_id, &format!("/categories/{category_id}"));
        self.send(ApiRequest::delete(path)).await.map(drop)
    }

    /// Upload the image shown for a category.
    ///
    /// # Errors
    ///
    /// Returns the normalized call failure.
    pub async fn upload_category_image(
        &self,
        chatbot_id: u64,
        category_id: u64,
        image: Upload,
    ) -> Result<(), ApiError> {
        let form = MultipartForm::new()
            .text("category_id", category_id.to_string())
            .file("image", image.file_name, image.content_type, image.bytes);
        let request =
            ApiRequest::post(chatbot_path(chatbot_id, "/categories/image")).with_form(form);
        self.send(request).await.map(drop)
    }

    /// Questions filed under one category.
    ///
    /// # Errors
    ///
    /// Returns the normalized call failure.
    pub async fn questions(
        &self,
        chatbot_id: u64,
        category_id: u64,
    ) -> Result<Vec<Question>, ApiError> {
        let path = chatbot_path(chatbot_id, &format!("/questions/{category_id}"));
        let list: QuestionList<Question> = self.fetch(ApiRequest::get(path)).await?;
        Ok(list.questions)
    }

    /// File a question under a category.
    ///
    /// # Errors
    ///
    /// Returns the normalized call failure.
    pub async fn create_question(
        &self,
        chatbot_id: u64,
        category_id: u64,
        draft: &QuestionDraft,
    ) -> Result<(), ApiError> {
        let request = ApiRequest::post(chatbot_path(chatbot_id, "/questions"))
            .with_json(draft.to_json(Some(category_id)));
        self.send(request).await.map(drop)
    }

    /// Delete a categorised question. The backend addresses these without
    /// the chatbot id.
    ///
    /// # Errors
    ///
    /// Returns the normalized call failure.
    pub async fn delete_question(&self, question_id: u64) -> Result<(), ApiError> {
        let path = api_path(format!("/chatbots/questions/{question_id}"));
        self.send(ApiRequest::delete(path)).await.map(drop)
    }

    /// Questions answered regardless of category.
    ///
    /// # Errors
    ///
    /// Returns the normalized call failure.
    pub async fn general_questions(
        &self,
        chatbot_id: u64,
    ) -> Result<Vec<GeneralQuestion>, ApiError> {
        let list: QuestionList<GeneralQuestion> = self
            .fetch(ApiRequest::get(chatbot_path(chatbot_id, "/general-questions")))
            .await?;
        Ok(list.questions)
    }

    /// Add a general question.
    ///
    /// # Errors
    ///
    /// Returns the normalized call failure.
    pub async fn create_general_question(
        &self,
        chatbot_id: u64,
        draft: &QuestionDraft,
    ) -> Result<(), ApiError> {
        let request = ApiRequest::post(chatbot_path(chatbot_id, "/general-questions"))
            .with_json(draft.to_json(None));
        self.send(request).await.map(drop)
    }

    /// Remove a general question by document id.
    ///
    /// # Errors
    ///
    /// Returns the normalized call failure.
    pub async fn delete_general_question(
        &self,
        chatbot_id: u64,
        question_id: &str,
    ) -> Result<(), ApiError> {
        let path = chatbot_path(chatbot_id, &format!("/general-questions/{question_id}"));
        self.send(ApiRequest::delete(path)).await.map(drop)
    }

    /// Knowledge files attached to a chatbot.
    ///
    /// # Errors
    ///
    /// Returns the normalized call failure.
    pub async fn files(&self, chatbot_id: u64) -> Result<Vec<ChatbotFile>, ApiError> {
        let list: FileList = self
            .fetch(ApiRequest::get(chatbot_path(chatbot_id, "/files")))
            .await?;
        Ok(list.files)
    }

    /// Upload a knowledge file.
    ///
    /// # Errors
    ///
    /// Returns the normalized call failure.
    pub async fn upload_file(&self, chatbot_id: u64, upload: &FileUpload) -> Result<(), ApiError> {
        let request =
            ApiRequest::post(chatbot_path(chatbot_id, "/files")).with_json(upload.to_json());
        self.send(request).await.map(drop)
    }

    /// Download and decode a knowledge file.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::UnexpectedPayload`] when the response lacks the
    /// file data or type, or carries data that is not base64.
    pub async fn download_file(
        &self,
        chatbot_id: u64,
        file_id: u64,
    ) -> Result<FileContent, ApiError> {
        let path = chatbot_path(chatbot_id, &format!("/files/{file_id}"));
        let download: FileDownload = self.fetch(ApiRequest::get(path)).await?;
        download
            .file
            .and_then(|file| file.decode())
            .ok_or_else(|| ApiError::UnexpectedPayload {
                message: "Invalid file data received".to_owned(),
            })
    }

    /// Delete a knowledge file.
    ///
    /// # Errors
    ///
    /// Returns the normalized call failure.
    pub async fn delete_file(&self, chatbot_id: u64, file_id: u64) -> Result<(), ApiError> {
        let path = chatbot_path(chatbot_id, &format!("/files/{file_id}"));
        self.send(ApiRequest::delete(path)).await.map(drop)
    }
}
